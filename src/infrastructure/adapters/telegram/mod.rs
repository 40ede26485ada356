//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities;
use crate::domain::traits::{Bot, BotInfo};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl User {
    /// Convert to the domain identity the cogs key their records on
    pub fn to_domain(&self) -> entities::User {
        let mut user = entities::User::new(self.id);
        user.is_bot = self.is_bot;
        if let Some(ref username) = self.username {
            user = user.with_username(username.clone());
        }
        if let Some(ref first) = self.first_name {
            user = user.with_first_name(first.clone());
        }
        user
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "levelbot".to_string(),
                username: "levelbot".to_string(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            result: BotInfoResponse,
        }

        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let url = self.api_url("getMe");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = BotInfo {
            id: data.result.id.to_string(),
            name: data.result.first_name,
            username: data.result.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using the getUpdates long poll
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: Vec<Update>,
        }

        let url = self.api_url("getUpdates");
        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// The offset to pass to the next getUpdates call
    pub fn next_offset(updates: &[Update], current: i64) -> i64 {
        updates
            .iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
        }

        let url = self.api_url("sendMessage");
        let request = SendMessageRequest { chat_id, text };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_offset_advances_past_the_newest_update() {
        let updates = vec![
            Update {
                update_id: 10,
                message: None,
            },
            Update {
                update_id: 12,
                message: None,
            },
        ];
        assert_eq!(TelegramAdapter::next_offset(&updates, 5), 13);
    }

    #[test]
    fn next_offset_keeps_current_when_idle() {
        assert_eq!(TelegramAdapter::next_offset(&[], 5), 5);
    }
}
