//! Reply router - Decides where a command's reply is posted

use std::sync::Arc;

use super::format::quote_info;
use crate::application::errors::BotError;
use crate::domain::entities::{PhaseOutcome, Reply, ReplyItem, Response};
use crate::domain::traits::MessagingApi;

/// Where the event being answered came from
#[derive(Debug, Clone, Copy)]
pub struct ReplyTarget<'a> {
    pub room_id: &'a str,
    pub user_email: &'a str,
    pub is_one_on_one: bool,
    pub thread_root_id: Option<&'a str>,
}

/// Outcome of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    NoReply,
    Sent,
}

pub struct ReplyRouter {
    api: Arc<dyn MessagingApi>,
    threads: bool,
}

impl ReplyRouter {
    pub fn new(api: Arc<dyn MessagingApi>, threads: bool) -> Self {
        Self { api, threads }
    }

    pub fn threads(&self) -> bool {
        self.threads
    }

    /// Send a phase outcome
    pub async fn deliver_outcome(&self, outcome: PhaseOutcome, target: &ReplyTarget<'_>) -> Result<Delivery, BotError> {
        self.deliver(outcome.reply, outcome.one_to_one, target).await
    }

    /// Send `reply`, redirecting plain text to a one-on-one space when `redirect_private` is set
    pub async fn deliver(
        &self,
        reply: Option<Reply>,
        redirect_private: bool,
        target: &ReplyTarget<'_>,
    ) -> Result<Delivery, BotError> {
        let Some(reply) = reply else {
            return Ok(Delivery::NoReply);
        };

        let mut delivery = Delivery::NoReply;
        match reply {
            Reply::Response(response) => {
                self.send_response(response, target).await?;
                delivery = Delivery::Sent;
            }
            Reply::Many(items) => {
                for item in items {
                    match item {
                        ReplyItem::Response(response) => self.send_response(response, target).await?,
                        ReplyItem::Text(text) if text.is_empty() => continue,
                        ReplyItem::Text(text) => self.send_text(&text, redirect_private, target).await?,
                    }
                    delivery = Delivery::Sent;
                }
            }
            // Empty text is no reply at all
            Reply::Text(text) if text.is_empty() => {}
            Reply::Text(text) => {
                self.send_text(&text, redirect_private, target).await?;
                delivery = Delivery::Sent;
            }
        }
        Ok(delivery)
    }

    fn thread_parent<'a>(&self, target: &ReplyTarget<'a>) -> Option<&'a str> {
        if self.threads {
            target.thread_root_id
        } else {
            None
        }
    }

    async fn send_response(&self, mut response: Response, target: &ReplyTarget<'_>) -> Result<(), BotError> {
        if !response.has_destination() {
            response.room_id = Some(target.room_id.to_string());
        }
        if response.parent_id.is_none() {
            response.parent_id = self.thread_parent(target).map(str::to_string);
        }
        self.api.create_message(&response).await?;
        Ok(())
    }

    async fn send_text(&self, text: &str, redirect_private: bool, target: &ReplyTarget<'_>) -> Result<(), BotError> {
        let parent = self.thread_parent(target);

        let mut messages = Vec::with_capacity(2);
        if redirect_private {
            if !target.is_one_on_one {
                let heads_up = quote_info(&format!(
                    "{} I've messaged you 1-1. Please reply to me there.",
                    target.user_email
                ));
                messages.push(Response::to_room(target.room_id, heads_up));
            }
            messages.push(Response::to_person(target.user_email, text));
        } else {
            messages.push(Response::to_room(target.room_id, text));
        }

        for mut message in messages {
            message.parent_id = parent.map(str::to_string);
            self.api.create_message(&message).await?;
        }
        Ok(())
    }
}
