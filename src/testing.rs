//! In-memory `MessagingApi` double for unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{Membership, Person, Response};
use crate::domain::traits::MessagingApi;

pub struct RecordingApi {
    sent: Mutex<Vec<Response>>,
    deleted: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
    members: HashMap<String, Vec<String>>,
    failing_rooms: Vec<String>,
    me_failures: AtomicU32,
    me_calls: AtomicU32,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
            members: HashMap::new(),
            failing_rooms: Vec::new(),
            me_failures: AtomicU32::new(0),
            me_calls: AtomicU32::new(0),
        }
    }

    pub fn with_member(mut self, room_id: &str, email: &str) -> Self {
        self.members.entry(room_id.to_string()).or_default().push(email.to_string());
        self
    }

    pub fn with_failing_room(mut self, room_id: &str) -> Self {
        self.failing_rooms.push(room_id.to_string());
        self
    }

    /// Make the next `count` identity lookups fail with a connection error
    pub fn with_me_failures(self, count: u32) -> Self {
        self.me_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn sent(&self) -> Vec<Response> {
        self.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn membership_lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn me_calls(&self) -> u32 {
        self.me_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingApi for RecordingApi {
    async fn create_message(&self, message: &Response) -> Result<String, BotError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), BotError> {
        self.deleted.lock().unwrap().push(message_id.to_string());
        Ok(())
    }

    async fn me(&self) -> Result<Person, BotError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.me_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.me_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(BotError::Network("connection refused".to_string()));
        }
        Ok(Person::new("bot-id", "Relay Bot")
            .with_email("relay@webex.bot")
            .with_type("bot"))
    }

    async fn list_memberships(&self, room_id: &str, person_email: &str) -> Result<Vec<Membership>, BotError> {
        self.lookups.lock().unwrap().push(room_id.to_string());
        if self.failing_rooms.iter().any(|r| r == room_id) {
            return Err(BotError::Api { status: 404, message: "room not found".to_string() });
        }
        Ok(self
            .members
            .get(room_id)
            .into_iter()
            .flatten()
            .filter(|email| email.as_str() == person_email)
            .map(|email| Membership::new(room_id, email.as_str()))
            .collect())
    }
}
