use serde::{Deserialize, Serialize};

/// Sender tag that maps to [`Role::User`]. Every other tag is the assistant.
pub const USER_SENDER: &str = "user";

/// Role of a message on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role/content pair as sent to the completion endpoint.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One entry of a stored conversation, as the chat UI persists it.
///
/// Only `sender` and `text` are read; the remaining fields are carried so a
/// stored history round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl HistoryEntry {
    /// Creates an entry with just a sender tag and text.
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            id: None,
            timestamp: None,
            is_error: None,
        }
    }

    /// Wire role for this entry.
    pub fn role(&self) -> Role {
        if self.sender == USER_SENDER {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// Converts a stored conversation plus the new outbound text into the
/// ordered message list, with the new text appended last as a user message.
pub fn adapt_history(history: &[HistoryEntry], message: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend(history.iter().map(|entry| Message {
        role: entry.role(),
        content: entry.text.clone(),
    }));
    messages.push(Message::user(message));
    messages
}
