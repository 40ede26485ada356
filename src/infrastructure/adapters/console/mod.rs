//! Console adapter for development/testing

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::traits::{Bot, BotInfo};

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "levelbot".to_string(),
                username: "console".to_string(),
            },
        }
    }

    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        use std::io::Write;
        print!("{}", prompt);
        std::io::stdout().flush().ok()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok()?;
        if input.is_empty() {
            // EOF
            return None;
        }
        Some(input.trim().to_string())
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<(), BotError> {
        println!("[BOT] {}", text);
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
