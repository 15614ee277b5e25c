//! Console adapter for development/testing

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::errors::BotError;
use crate::application::messaging::{Delivery, MessageDispatcher};
use crate::domain::entities::{Activity, IncomingEvent, Membership, Person, Response, CALLBACK_KEYWORD_KEY};
use crate::domain::traits::MessagingApi;

/// Prefix of a console line that submits a card
const CARD_PREFIX: &str = "card ";

/// Console adapter for local development
///
/// Acts both as the messaging backend (sends are printed and recorded) and as
/// the transport (stdin lines become incoming events).
pub struct ConsoleAdapter {
    room_id: String,
    user_email: String,
    one_on_one: bool,
    print: bool,
    identity: Person,
    members: HashMap<String, Vec<String>>,
    sent: Mutex<Vec<Response>>,
    deleted: Mutex<Vec<String>>,
    last_card: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl ConsoleAdapter {
    pub fn new(user_email: impl Into<String>) -> Self {
        Self {
            room_id: "console-room".to_string(),
            user_email: user_email.into(),
            one_on_one: false,
            print: true,
            identity: Person::new("console-bot", "Webex Bot")
                .with_email("console@webex.bot")
                .with_type("bot"),
            members: HashMap::new(),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            last_card: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = room_id.into();
        self
    }

    /// Pretend the conversation is a private space with the bot
    pub fn one_on_one(mut self) -> Self {
        self.one_on_one = true;
        self
    }

    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.identity.display_name = name.into();
        self
    }

    pub fn with_member(mut self, room_id: impl Into<String>, email: impl Into<String>) -> Self {
        self.members.entry(room_id.into()).or_default().push(email.into());
        self
    }

    /// Record sends without printing them
    pub fn quiet(mut self) -> Self {
        self.print = false;
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn sent(&self) -> Vec<Response> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn next_message_id(&self) -> String {
        format!("console-msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn activity(&self) -> Activity {
        let activity = Activity::from_person(uuid::Uuid::new_v4().to_string(), self.user_email.clone());
        if self.one_on_one {
            activity.one_on_one()
        } else {
            activity
        }
    }

    /// Turn a console line into an incoming event
    ///
    /// `card <keyword> [key=value ...]` submits the most recently shown card
    /// with `keyword` as its callback; anything else is typed text.
    pub fn parse_line(&self, line: &str) -> Option<IncomingEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(rest) = line.strip_prefix(CARD_PREFIX) else {
            return Some(IncomingEvent::text(
                self.room_id.clone(),
                self.user_email.clone(),
                line,
                self.activity(),
            ));
        };

        let mut parts = rest.split_whitespace();
        let mut inputs = Map::new();
        if let Some(keyword) = parts.next() {
            inputs.insert(CALLBACK_KEYWORD_KEY.to_string(), Value::String(keyword.to_string()));
        }
        for pair in parts {
            if let Some((key, value)) = pair.split_once('=') {
                inputs.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        let event = IncomingEvent::card_action(self.room_id.clone(), inputs, self.activity());
        let last_card = self.last_card.lock().ok().and_then(|c| c.clone());
        Some(match last_card {
            Some(id) => event.with_message_id(id),
            None => event,
        })
    }

    /// Parse `line` and hand it to the dispatcher
    pub async fn dispatch_line(&self, dispatcher: &MessageDispatcher, line: &str) -> Result<Delivery, BotError> {
        let Some(event) = self.parse_line(line) else {
            return Ok(Delivery::NoReply);
        };

        if event.is_card_action() {
            dispatcher.process_incoming_card_action(&event).await
        } else {
            dispatcher.process_incoming_message(&event).await
        }
    }

    fn print_message(&self, id: &str, message: &Response) {
        let destination = message
            .room_id
            .as_deref()
            .or(message.to_person_email.as_deref())
            .unwrap_or("?");
        let thread = message
            .parent_id
            .as_deref()
            .map(|p| format!(" (thread {})", p))
            .unwrap_or_default();
        let body = message.markdown.as_deref().or(message.text.as_deref()).unwrap_or("");

        println!("[BOT -> {}]{} {}", destination, thread, body);
        for attachment in &message.attachments {
            println!("  [Card {}] {}", id, attachment.content);
        }
    }
}

#[async_trait]
impl MessagingApi for ConsoleAdapter {
    async fn create_message(&self, message: &Response) -> Result<String, BotError> {
        let id = self.next_message_id();
        if self.print {
            self.print_message(&id, message);
        }
        if !message.attachments.is_empty() {
            if let Ok(mut last_card) = self.last_card.lock() {
                *last_card = Some(id.clone());
            }
        }
        self.sent
            .lock()
            .map_err(|e| BotError::Internal(e.to_string()))?
            .push(message.clone());
        Ok(id)
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), BotError> {
        tracing::debug!("Deleting console message {}", message_id);
        if self.print {
            println!("[BOT] (deleted {})", message_id);
        }
        self.deleted
            .lock()
            .map_err(|e| BotError::Internal(e.to_string()))?
            .push(message_id.to_string());
        Ok(())
    }

    async fn me(&self) -> Result<Person, BotError> {
        Ok(self.identity.clone())
    }

    async fn list_memberships(&self, room_id: &str, person_email: &str) -> Result<Vec<Membership>, BotError> {
        Ok(self
            .members
            .get(room_id)
            .into_iter()
            .flatten()
            .filter(|email| email.eq_ignore_ascii_case(person_email))
            .map(|email| Membership::new(room_id, email.as_str()))
            .collect())
    }
}
