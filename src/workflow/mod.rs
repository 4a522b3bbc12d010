pub mod reply_flow;

pub use reply_flow::ReplyFlow;
