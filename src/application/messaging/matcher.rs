//! Command matcher - Picks the command an event is addressed to

use std::sync::Arc;

use crate::domain::entities::{Command, MatchMode};

/// Find the command for `raw`, first match in registration order
///
/// Card callbacks compare against keywords and callback keywords. Plain text
/// only considers commands with a keyword, honouring their match mode.
pub fn find_command(commands: &[Arc<dyn Command>], raw: &str, is_card_callback: bool) -> Option<Arc<dyn Command>> {
    let user_command = raw.to_lowercase();
    tracing::info!("New user_command: {}", user_command);
    tracing::info!("is_card_callback_command: {}", is_card_callback);

    commands
        .iter()
        .find(|c| {
            tracing::debug!("Checking command keyword: {}", c.keyword());
            if is_card_callback {
                matches_callback(c.as_ref(), &user_command)
            } else {
                matches_text(c.as_ref(), &user_command)
            }
        })
        .cloned()
}

fn matches_callback(command: &dyn Command, user_command: &str) -> bool {
    if user_command.is_empty() {
        return false;
    }
    command.keyword().to_lowercase() == user_command
        || command
            .card_callback_keyword()
            .is_some_and(|k| k.to_lowercase() == user_command)
}

fn matches_text(command: &dyn Command, user_command: &str) -> bool {
    let keyword = command.keyword().to_lowercase();
    if keyword.is_empty() {
        return false;
    }
    match command.match_mode() {
        MatchMode::Exact => {
            let found = user_command == keyword;
            if found {
                tracing::info!("Exact match found!");
            }
            found
        }
        MatchMode::Substring => {
            let found = user_command.contains(&keyword);
            if found {
                tracing::info!("Sub-string match found!");
            }
            found
        }
    }
}
