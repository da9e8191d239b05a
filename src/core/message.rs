use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::ChatMessage;
use crate::core::constants::{WELCOME_ID, WELCOME_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Only synthesized for outbound requests; never stored.
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Ids are derived from the creation time. Collisions are tolerated since
    /// ids only key visible units.
    pub fn new(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: timestamp.to_string(),
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Role::User, content, timestamp)
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Role::Assistant, content, timestamp)
    }

    pub fn welcome(timestamp: i64) -> Self {
        Self {
            id: WELCOME_ID.to_string(),
            ..Self::assistant(WELCOME_MESSAGE, timestamp)
        }
    }

    /// Wire form: role and content only.
    pub fn to_api(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.as_str().to_string(),
            content: self.content.clone(),
        }
    }
}

/// Append-only conversation log. Append order is display order.
#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// A store holding only the assistant welcome message.
    pub fn seeded(now: i64) -> Self {
        Self {
            messages: vec![Message::welcome(now)],
        }
    }

    pub fn append(&mut self, message: Message) {
        if message.role == Role::System {
            warn!("refusing to store a system message");
            return;
        }
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_holds_single_welcome() {
        let store = MessageStore::seeded(42);
        assert_eq!(store.len(), 1);
        let welcome = &store.all()[0];
        assert_eq!(welcome.id, "welcome");
        assert_eq!(welcome.role, Role::Assistant);
        assert_eq!(welcome.content, WELCOME_MESSAGE);
        assert_eq!(welcome.timestamp, 42);
    }

    #[test]
    fn append_preserves_order() {
        let mut store = MessageStore::seeded(0);
        store.append(Message::user("first", 1));
        store.append(Message::assistant("second", 2));
        let contents: Vec<_> = store.all().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec![WELCOME_MESSAGE, "first", "second"]);
        assert_eq!(store.last().map(|m| m.id.as_str()), Some("2"));
    }

    #[test]
    fn system_messages_are_never_stored() {
        let mut store = MessageStore::seeded(0);
        store.append(Message::new(Role::System, "persona", 1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn api_form_strips_id_and_timestamp() {
        let api = Message::user("hello", 7).to_api();
        assert_eq!(api.role, "user");
        assert_eq!(api.content, "hello");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).expect("serialize");
        assert_eq!(json, "\"assistant\"");
    }
}
