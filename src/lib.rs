//! Command-dispatch engine for Webex chat bots

pub mod domain;
pub mod application;
pub mod infrastructure;

#[cfg(test)]
mod testing;

pub use application::commands::{EchoCommand, HelpCommand, KeywordCommand};
pub use application::errors::{BotError, CommandError, ConfigError};
pub use application::messaging::{BotSettings, Delivery, MessageDispatcher};
pub use domain::entities::{Command, CommandContext, CommandResult, IncomingEvent, Reply, Response};
pub use infrastructure::config::Config;
