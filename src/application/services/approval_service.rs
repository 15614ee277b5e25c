use crate::domain::traits::MessagingApi;

/// Who may talk to the bot: approved users, email domains and rooms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalPolicy {
    users: Vec<String>,
    domains: Vec<String>,
    rooms: Vec<String>,
}

impl ApprovalPolicy {
    pub fn new(users: Vec<String>, domains: Vec<String>, rooms: Vec<String>) -> Self {
        Self {
            users: users.into_iter().map(|u| u.to_lowercase()).collect(),
            domains: domains.into_iter().map(|d| d.to_lowercase()).collect(),
            rooms,
        }
    }

    /// Bot-wide approved rooms
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// True when no user, domain or room restriction is configured
    pub fn is_open(&self) -> bool {
        let open = self.users.is_empty() && self.domains.is_empty() && self.rooms.is_empty();
        if open {
            tracing::warn!("Your bot is open to anyone on Webex Teams...");
        }
        open
    }

    /// Check `user_email` against the approved users and domains and membership of `rooms`
    ///
    /// `rooms` is the bot-wide list for the global check, or a command's own list.
    pub async fn check(&self, api: &dyn MessagingApi, user_email: &str, rooms: &[String]) -> bool {
        self.is_open();
        let email = user_email.to_lowercase();

        let approved = if self.users.is_empty() && self.domains.is_empty() && rooms.is_empty() {
            true
        } else if self.domain_approved(&email) || self.users.contains(&email) {
            true
        } else {
            is_member_of_any(api, user_email, rooms).await
        };

        if !approved {
            tracing::warn!("{} is not approved to interact at this time. Ignoring.", user_email);
        }
        approved
    }

    fn domain_approved(&self, email: &str) -> bool {
        match email.rsplit_once('@') {
            Some((_, domain)) => self.domains.iter().any(|d| d == domain),
            None => false,
        }
    }
}

/// Membership lookups that fail only rule out the room they were made for
async fn is_member_of_any(api: &dyn MessagingApi, user_email: &str, rooms: &[String]) -> bool {
    for room in rooms {
        match api.list_memberships(room, user_email).await {
            Ok(members) => {
                if members.iter().any(|m| m.person_email.eq_ignore_ascii_case(user_email)) {
                    return true;
                }
            }
            Err(e) => {
                tracing::warn!("API error: {}", e);
            }
        }
    }
    false
}
