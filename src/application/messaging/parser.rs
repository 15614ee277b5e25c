//! Message parser - Normalizes raw event text before and after matching

use crate::domain::entities::{IncomingEvent, CALLBACK_KEYWORD_KEY, COMMAND_KEYWORD_KEY};

/// What a card submission asks the dispatcher to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInvocation {
    pub raw_message: String,
    /// The card named its callback rather than a command keyword
    pub is_card_callback: bool,
}

/// Remove mentions of the bot from text posted in a shared space
pub fn strip_bot_name(text: &str, bot_display_name: &str) -> String {
    if bot_display_name.is_empty() {
        return text.trim().to_string();
    }
    text.replace(bot_display_name, "").trim().to_string()
}

/// Text handed to a command: the input minus a leading keyword, compared case-insensitively
pub fn message_without_keyword<'a>(keyword: &str, message: &'a str) -> &'a str {
    if keyword.is_empty() {
        return message;
    }
    match message.get(..keyword.len()) {
        Some(head) if head.to_lowercase() == keyword.to_lowercase() => &message[keyword.len()..],
        _ => message,
    }
}

/// Read the callback or command keyword out of a card submission
pub fn parse_card_action(event: &IncomingEvent) -> CardInvocation {
    match event.input(CALLBACK_KEYWORD_KEY) {
        Some(callback) => CardInvocation {
            raw_message: callback.to_string(),
            is_card_callback: true,
        },
        None => CardInvocation {
            raw_message: event.input(COMMAND_KEYWORD_KEY).unwrap_or_default().to_string(),
            is_card_callback: false,
        },
    }
}
