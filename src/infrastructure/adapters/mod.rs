//! Platform adapters

pub mod console;
pub mod webex;

pub use console::ConsoleAdapter;
pub use webex::WebexClient;
