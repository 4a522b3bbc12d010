pub mod toml_loader;

pub use toml_loader::{load_reply_from_toml, ReplyDraft};
