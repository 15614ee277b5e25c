//! Domain entities - Core business objects

pub mod user;
pub mod message;
pub mod reply;
pub mod command;

pub use user::{Person, Membership};
pub use message::{Activity, ActorType, EventKind, IncomingEvent, CALLBACK_KEYWORD_KEY, COMMAND_KEYWORD_KEY};
pub use reply::{Attachment, PhaseOutcome, Reply, ReplyItem, Response, ADAPTIVE_CARD_CONTENT_TYPE};
pub use command::{Command, CommandContext, CommandRegistry, CommandResult, MatchMode};
