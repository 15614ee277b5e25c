use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entities::{Command, CommandContext, CommandResult, MatchMode};

/// Command handler function type
pub type CommandHandler = Box<dyn Fn(&str, &CommandContext<'_>) -> CommandResult + Send + Sync>;

/// Command assembled from a keyword, options and a handler closure
pub struct KeywordCommand {
    pub keyword: String,
    pub help_message: String,
    pub match_mode: MatchMode,
    pub card_callback_keyword: Option<String>,
    pub card: Option<serde_json::Value>,
    pub chained: Vec<Arc<dyn Command>>,
    pub approved_rooms: Vec<String>,
    pub delete_previous_message: bool,
    pub handler: Option<CommandHandler>,
}

impl KeywordCommand {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            help_message: String::new(),
            match_mode: MatchMode::Substring,
            card_callback_keyword: None,
            card: None,
            chained: Vec::new(),
            approved_rooms: Vec::new(),
            delete_previous_message: false,
            handler: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help_message = help.into();
        self
    }

    /// Only match when the whole message is the keyword
    pub fn exact(mut self) -> Self {
        self.match_mode = MatchMode::Exact;
        self
    }

    pub fn with_callback_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.card_callback_keyword = Some(keyword.into());
        self
    }

    pub fn with_card(mut self, card: serde_json::Value) -> Self {
        self.card = Some(card);
        self
    }

    pub fn with_chained(mut self, command: Arc<dyn Command>) -> Self {
        self.chained.push(command);
        self
    }

    pub fn with_approved_rooms(mut self, rooms: Vec<String>) -> Self {
        self.approved_rooms = rooms;
        self
    }

    pub fn deleting_previous_message(mut self) -> Self {
        self.delete_previous_message = true;
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &CommandContext<'_>) -> CommandResult + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }
}

#[async_trait]
impl Command for KeywordCommand {
    fn keyword(&self) -> &str {
        &self.keyword
    }

    fn help_message(&self) -> &str {
        &self.help_message
    }

    fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    fn card_callback_keyword(&self) -> Option<&str> {
        self.card_callback_keyword.as_deref()
    }

    fn card(&self) -> Option<&serde_json::Value> {
        self.card.as_ref()
    }

    fn chained_commands(&self) -> Vec<Arc<dyn Command>> {
        self.chained.clone()
    }

    fn approved_rooms(&self) -> &[String] {
        &self.approved_rooms
    }

    fn delete_previous_message(&self) -> bool {
        self.delete_previous_message
    }

    async fn execute(&self, message: &str, ctx: &CommandContext<'_>) -> CommandResult {
        match &self.handler {
            Some(handler) => handler(message, ctx),
            None => Ok(None),
        }
    }
}
