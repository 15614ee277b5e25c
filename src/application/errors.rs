//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether the failure happened before the backend answered at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, BotError::Network(_))
    }
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    /// Recoverable failure carrying the reply the user should see instead.
    #[error("{debug_message}")]
    Reply {
        reply_message: String,
        reply_one_to_one: bool,
        debug_message: String,
    },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Bot(Box<BotError>),
}

impl CommandError {
    /// Reply with `reply_message` in the originating room.
    pub fn reply(reply_message: impl Into<String>, debug_message: impl Into<String>) -> Self {
        CommandError::Reply {
            reply_message: reply_message.into(),
            reply_one_to_one: false,
            debug_message: debug_message.into(),
        }
    }

    /// Reply with `reply_message` in a private one-on-one space.
    pub fn reply_one_to_one(reply_message: impl Into<String>, debug_message: impl Into<String>) -> Self {
        CommandError::Reply {
            reply_message: reply_message.into(),
            reply_one_to_one: true,
            debug_message: debug_message.into(),
        }
    }
}

impl From<BotError> for CommandError {
    fn from(e: BotError) -> Self {
        CommandError::Bot(Box::new(e))
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(
        "Error adding new command: '{command}'. Duplicate callback_keyword found: '{keyword}'. \
         Use a unique keyword in your '{command}' adaptive card JSON."
    )]
    DuplicateCallbackKeyword { command: String, keyword: String },
}
