use thiserror::Error;

use crate::messages::{Templates, DEFAULT_SET_CHANCE_MESSAGE, DEFAULT_SHOW_CHANCE_MESSAGE};

pub const DEFAULT_DOC_PATH: &str = "collection/chats";
pub const DEFAULT_REPLY_MESSAGE: &str = "Fine.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub doc_path: String,
    pub templates: Templates,
    /// Sent in reply to messages that pass the gate.
    pub reply_message: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            doc_path: or("CHANCE_DOC_PATH", DEFAULT_DOC_PATH),
            templates: Templates {
                show_chance: or("SHOW_CHANCE_MESSAGE", DEFAULT_SHOW_CHANCE_MESSAGE),
                set_chance: or("SET_CHANCE_MESSAGE", DEFAULT_SET_CHANCE_MESSAGE),
            },
            reply_message: or("REPLY_MESSAGE", DEFAULT_REPLY_MESSAGE),
        })
    }
}
