pub mod loaders;
pub mod outcome;
pub mod reply;
pub mod site;

pub use loaders::{load_reply_from_toml, ReplyDraft};
pub use outcome::{ReplyOutcome, ResponseContext};
pub use reply::{ReplyFile, ReplyRequest};
pub use site::SiteAuthentication;
