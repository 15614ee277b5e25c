//! Built-in commands and the builder for user-defined ones

pub mod echo;
pub mod help;
pub mod keyword;

pub use echo::EchoCommand;
pub use help::HelpCommand;
pub use keyword::{CommandHandler, KeywordCommand};
