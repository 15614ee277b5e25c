use serde::{Deserialize, Serialize};
use std::fmt;

/// A person (or bot) identity as reported by the messaging backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(rename = "type", default)]
    pub person_type: Option<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            emails: Vec::new(),
            person_type: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.emails.push(email.into());
        self
    }

    pub fn with_type(mut self, person_type: impl Into<String>) -> Self {
        self.person_type = Some(person_type.into());
        self
    }

    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Membership of a person in a room
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default)]
    pub id: Option<String>,
    pub room_id: String,
    pub person_email: String,
}

impl Membership {
    pub fn new(room_id: impl Into<String>, person_email: impl Into<String>) -> Self {
        Self {
            id: None,
            room_id: room_id.into(),
            person_email: person_email.into(),
        }
    }
}
