//! Configuration module for the Pet Pals client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend (record, object and session stores)
    pub api_url: String,
    /// Publishable API key sent with every request
    pub api_key: Option<String>,
    /// Path to the persisted session file
    pub session_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_url = env::var("PETPALS_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:54321".to_string());

        let api_key = env::var("PETPALS_API_KEY").ok();

        let session_path = env::var("PETPALS_SESSION_PATH")
            .unwrap_or_else(|_| "./data/session.json".to_string())
            .into();

        let log_level = env::var("PETPALS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_url,
            api_key,
            session_path,
            log_level,
        }
    }
}
