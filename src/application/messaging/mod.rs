//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod format;
pub mod matcher;
pub mod parser;
pub mod pipeline;
pub mod router;

pub use dispatcher::{BotSettings, DefaultHandler, MessageDispatcher, ProxySettings, RetryPolicy};
pub use router::{Delivery, ReplyRouter, ReplyTarget};
