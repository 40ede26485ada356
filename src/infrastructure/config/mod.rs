//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    /// Path to the sqlite file backing the document store
    pub path: PathBuf,
    /// Collection holding user records
    pub users_collection: String,
    /// Collection holding mute records
    pub mutes_collection: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "levelbot".to_string(),
                prefix: "/".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("levelbot.db"),
                users_collection: "users".to_string(),
                mutes_collection: "mutes".to_string(),
            },
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                }),
                console: Some(ConsoleConfig { enabled: true }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if let Some(ref mut tg) = config.adapters.telegram {
                tg.token = Some(token);
                tg.enabled = true;
            }
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            config.bot.prefix = prefix;
        }

        if let Ok(path) = std::env::var("BOT_DB_PATH") {
            config.database.path = PathBuf::from(path);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.database.users_collection, "users");
        assert_eq!(config.database.mutes_collection, "mutes");
    }
}
