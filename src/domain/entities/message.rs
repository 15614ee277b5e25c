use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Card input naming the callback a submitted card belongs to
pub const CALLBACK_KEYWORD_KEY: &str = "callback_keyword";
/// Card input naming a command to invoke as if it had been typed
pub const COMMAND_KEYWORD_KEY: &str = "command_keyword";

/// Space tag marking a private two-party conversation
const ONE_ON_ONE_TAG: &str = "ONE_ON_ONE";

/// Who performed an activity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    Person,
    Bot,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    #[serde(default)]
    pub email_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Parent {
    pub id: String,
}

/// Transport-level activity wrapping an event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Activity {
    pub id: String,
    pub actor: Actor,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub parent: Option<Parent>,
}

impl Activity {
    pub fn new(id: impl Into<String>, actor_type: ActorType, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actor: Actor {
                actor_type,
                email_address: email.into(),
            },
            target: Target::default(),
            parent: None,
        }
    }

    /// Activity performed by a person
    pub fn from_person(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(id, ActorType::Person, email)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.target.tags.push(tag.into());
        self
    }

    pub fn one_on_one(self) -> Self {
        self.with_tag(ONE_ON_ONE_TAG)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(Parent { id: parent_id.into() });
        self
    }

    pub fn is_one_on_one(&self) -> bool {
        self.target.tags.iter().any(|t| t == ONE_ON_ONE_TAG)
    }

    pub fn is_from_person(&self) -> bool {
        self.actor.actor_type == ActorType::Person
    }

    /// Message a threaded reply nests under: the parent if any, else the activity itself
    pub fn thread_root_id(&self) -> &str {
        self.parent.as_ref().map(|p| p.id.as_str()).unwrap_or(&self.id)
    }
}

/// Kind of incoming event
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Text,
    CardAction { inputs: Map<String, Value> },
}

/// Normalized incoming event handed to the dispatcher
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub kind: EventKind,
    pub text: String,
    pub room_id: String,
    pub person_email: String,
    /// Deletable message the event refers to (the card message for card actions)
    pub message_id: Option<String>,
    pub activity: Activity,
    pub received_at: DateTime<Utc>,
}

impl IncomingEvent {
    pub fn text(
        room_id: impl Into<String>,
        person_email: impl Into<String>,
        text: impl Into<String>,
        activity: Activity,
    ) -> Self {
        Self {
            kind: EventKind::Text,
            text: text.into(),
            room_id: room_id.into(),
            person_email: person_email.into(),
            message_id: None,
            activity,
            received_at: Utc::now(),
        }
    }

    /// Card submission; the sender is taken from the activity actor
    pub fn card_action(room_id: impl Into<String>, inputs: Map<String, Value>, activity: Activity) -> Self {
        let person_email = activity.actor.email_address.clone();
        Self {
            kind: EventKind::CardAction { inputs },
            text: String::new(),
            room_id: room_id.into(),
            person_email,
            message_id: None,
            activity,
            received_at: Utc::now(),
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn is_card_action(&self) -> bool {
        matches!(self.kind, EventKind::CardAction { .. })
    }

    pub fn is_one_on_one(&self) -> bool {
        self.activity.is_one_on_one()
    }

    pub fn inputs(&self) -> Option<&Map<String, Value>> {
        match &self.kind {
            EventKind::CardAction { inputs } => Some(inputs),
            EventKind::Text => None,
        }
    }

    /// String value of a card input
    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs()?.get(key)?.as_str()
    }
}
