use std::sync::Arc;

use async_trait::async_trait;

use super::{IncomingEvent, Reply};
use crate::application::errors::{CommandError, ConfigError};

/// Result of a command phase
pub type CommandResult = Result<Option<Reply>, CommandError>;

/// How a command keyword is matched against plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The whole (lower-cased) message must equal the keyword
    Exact,
    /// The keyword may appear anywhere in the message
    #[default]
    Substring,
}

/// What a command phase gets to see besides its text
pub struct CommandContext<'a> {
    pub event: &'a IncomingEvent,
    pub commands: &'a [Arc<dyn Command>],
}

/// A bot command
///
/// Every phase has a no-op default, so a command only implements the phases
/// it cares about. `card_callback` runs `execute` unless overridden.
#[async_trait]
pub trait Command: Send + Sync {
    /// Keyword the command answers to; empty means it is only reachable via its card callback
    fn keyword(&self) -> &str;

    fn help_message(&self) -> &str {
        ""
    }

    fn match_mode(&self) -> MatchMode {
        MatchMode::Substring
    }

    fn card_callback_keyword(&self) -> Option<&str> {
        None
    }

    /// Adaptive card sent before the command executes
    fn card(&self) -> Option<&serde_json::Value> {
        None
    }

    fn chained_commands(&self) -> Vec<Arc<dyn Command>> {
        Vec::new()
    }

    /// Rooms whose members may run this command, replacing the bot-wide room list
    fn approved_rooms(&self) -> &[String] {
        &[]
    }

    fn delete_previous_message(&self) -> bool {
        false
    }

    async fn pre_card_load_reply(&self, _message: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        Ok(None)
    }

    async fn pre_execute(&self, _message: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        Ok(None)
    }

    async fn execute(&self, _message: &str, _ctx: &CommandContext<'_>) -> CommandResult {
        Ok(None)
    }

    async fn card_callback(&self, message: &str, ctx: &CommandContext<'_>) -> CommandResult {
        self.execute(message, ctx).await
    }
}

fn same_command(a: &Arc<dyn Command>, b: &Arc<dyn Command>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Registered commands, kept in registration order
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command together with everything it chains, transitively
    ///
    /// Commands are added depth-first in chain order. Nothing is registered
    /// when any of them reuses a card callback keyword.
    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<(), ConfigError> {
        let mut pending: Vec<Arc<dyn Command>> = Vec::new();
        let mut worklist = vec![command];

        while let Some(candidate) = worklist.pop() {
            if self.contains(&candidate) || pending.iter().any(|p| same_command(p, &candidate)) {
                continue;
            }
            worklist.extend(candidate.chained_commands().into_iter().rev());
            if let Some(keyword) = candidate.card_callback_keyword().filter(|k| !k.is_empty()) {
                tracing::debug!("Checking callback keyword '{}' of '{}'", keyword, candidate.keyword());
                let taken = self
                    .commands
                    .iter()
                    .chain(pending.iter())
                    .any(|c| c.card_callback_keyword() == Some(keyword));
                if taken {
                    return Err(ConfigError::DuplicateCallbackKeyword {
                        command: candidate.keyword().to_string(),
                        keyword: keyword.to_string(),
                    });
                }
            }
            pending.push(candidate);
        }

        self.commands.extend(pending);
        Ok(())
    }

    pub fn contains(&self, command: &Arc<dyn Command>) -> bool {
        self.commands.iter().any(|c| same_command(c, command))
    }

    pub fn list(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
