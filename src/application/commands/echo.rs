use async_trait::async_trait;

use crate::domain::entities::{Command, CommandContext, CommandResult, Reply};

/// Demo command repeating what it was sent
pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn keyword(&self) -> &str {
        "echo"
    }

    fn help_message(&self) -> &str {
        "Echo back what you said."
    }

    async fn execute(&self, message: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        Ok(Some(Reply::text(format!("You said: {}", message.trim()))))
    }
}
