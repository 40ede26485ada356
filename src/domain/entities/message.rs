use super::User;
use chrono::{DateTime, Utc};

/// Type of message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Command,
    Other(String),
}

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Content::Command { .. })
    }
}

/// Represents an incoming or outgoing message
#[derive(Debug, Clone)]
pub struct Message {
    pub chat_id: String,
    pub sender: Option<User>,
    pub content: Content,
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, content: Content) -> Self {
        Self {
            chat_id: chat_id.into(),
            sender: None,
            content,
            message_type: MessageType::Text,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(chat_id, Content::Text(text.into()))
    }

    pub fn from_command(
        chat_id: impl Into<String>,
        name: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        let mut msg = Self::new(
            chat_id,
            Content::Command {
                name: name.into(),
                args,
            },
        );
        msg.message_type = MessageType::Command;
        msg
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// The platform uid of whoever sent this message, if known
    pub fn sender_uid(&self) -> Option<i64> {
        self.sender.as_ref().map(|u| u.id)
    }
}
