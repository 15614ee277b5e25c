use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::{Command, CommandContext, CommandResult, Reply};

const HELP_KEYWORD: &str = "help";

/// Built-in command listing every other registered command
pub struct HelpCommand {
    keyword: String,
    subtitle: String,
}

impl HelpCommand {
    pub fn new(subtitle: impl Into<String>) -> Self {
        Self {
            keyword: HELP_KEYWORD.to_string(),
            subtitle: subtitle.into(),
        }
    }

    /// Answer to `keyword` instead of `help`
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    fn is_self(&self, command: &Arc<dyn Command>) -> bool {
        std::ptr::eq(Arc::as_ptr(command) as *const (), self as *const Self as *const ())
    }

    fn render(&self, ctx: &CommandContext<'_>) -> String {
        let mut help = "🛠️ Available Commands:\n".to_string();
        if !self.subtitle.is_empty() {
            help.push_str(&format!("{}\n", self.subtitle));
        }
        let lines: Vec<String> = ctx
            .commands
            .iter()
            .filter(|c| !c.keyword().is_empty() && !self.is_self(c))
            .map(|c| format!("\\{} - {}", c.keyword(), c.help_message()))
            .collect();
        help.push_str(&lines.join("\n"));
        help
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn keyword(&self) -> &str {
        &self.keyword
    }

    fn help_message(&self) -> &str {
        "List all available bot commands."
    }

    async fn execute(&self, _message: &str, ctx: &CommandContext<'_>) -> CommandResult {
        Ok(Some(Reply::Text(self.render(ctx))))
    }
}
