use serde::{Deserialize, Serialize};

/// Content type of an adaptive card attachment
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// Message attachment (adaptive cards)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: serde_json::Value,
}

impl Attachment {
    pub fn adaptive_card(content: serde_json::Value) -> Self {
        Self {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content,
        }
    }
}

/// Structured outgoing message, also the body of a create-message request
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_person_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markdown message into a room
    pub fn to_room(room_id: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id.into()),
            markdown: Some(markdown.into()),
            ..Self::default()
        }
    }

    /// Markdown message into the one-on-one space with a person
    pub fn to_person(email: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            to_person_email: Some(email.into()),
            markdown: Some(markdown.into()),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// A room or a person has already been chosen
    pub fn has_destination(&self) -> bool {
        self.room_id.is_some() || self.to_person_email.is_some()
    }
}

/// One element of a multi-part reply
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyItem {
    Response(Response),
    Text(String),
}

/// What a command phase asks to be sent back
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Response(Response),
    Many(Vec<ReplyItem>),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<String> for ReplyItem {
    fn from(text: String) -> Self {
        ReplyItem::Text(text)
    }
}

impl From<Response> for ReplyItem {
    fn from(response: Response) -> Self {
        ReplyItem::Response(response)
    }
}

/// A phase's reply together with the private-redirect flag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseOutcome {
    pub reply: Option<Reply>,
    pub one_to_one: bool,
}
