use async_trait::async_trait;
use crate::domain::entities::{Membership, Person, Response};
use crate::application::errors::BotError;

/// Messaging backend calls the dispatcher depends on
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Create a message, returning its id
    async fn create_message(&self, message: &Response) -> Result<String, BotError>;

    /// Delete a message by id
    async fn delete_message(&self, message_id: &str) -> Result<(), BotError>;

    /// Identity the bot is running as
    async fn me(&self) -> Result<Person, BotError>;

    /// Memberships of `person_email` in `room_id`
    async fn list_memberships(&self, room_id: &str, person_email: &str) -> Result<Vec<Membership>, BotError>;
}
