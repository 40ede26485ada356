//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Content, Message, MessageType, User};

/// Parses incoming text into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(
        &self,
        chat_id: impl Into<String>,
        text: impl Into<String>,
        sender: Option<User>,
    ) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.starts_with('/') || text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, text, sender);
        }

        Message::new(chat_id, Content::Text(text))
            .with_message_type(MessageType::Text)
            .with_sender_opt(sender)
    }

    /// Parse a command message
    fn parse_command(&self, chat_id: String, text: String, sender: Option<User>) -> Message {
        // Strip either the platform '/' or the configured prefix
        let cmd_text = if text.starts_with('/') {
            text.trim_start_matches('/')
        } else {
            text.trim_start_matches(&self.command_prefix)
        };

        let parts: Vec<&str> = cmd_text.split_whitespace().collect();
        let name = parts.first().unwrap_or(&"").to_string();
        let args: Vec<String> = parts
            .get(1..)
            .map(|s| s.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        Message::new(chat_id, Content::Command { name, args })
            .with_message_type(MessageType::Command)
            .with_sender_opt(sender)
    }
}

impl Message {
    /// Helper to set sender as Option
    pub fn with_sender_opt(mut self, user: Option<User>) -> Self {
        if let Some(u) = user {
            self.sender = Some(u);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_args() {
        let parser = MessageParser::new("!");
        let msg = parser.parse("1", "/mute 123456 10", None);

        let Content::Command { name, args } = msg.content else {
            panic!("expected a command");
        };
        assert_eq!(name, "mute");
        assert_eq!(args, vec!["123456", "10"]);
    }

    #[test]
    fn custom_prefix_is_recognized() {
        let parser = MessageParser::new("!");
        let msg = parser.parse("1", "!rank", None);
        assert!(msg.content.is_command());
    }

    #[test]
    fn plain_text_stays_text() {
        let parser = MessageParser::new("!");
        let msg = parser.parse("1", "hello there", None);
        assert_eq!(msg.content.text(), Some("hello there"));
    }
}
