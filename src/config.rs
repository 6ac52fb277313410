//! Configuration and settings management
//!
//! Loads settings from environment variables (and optional `config/*` files)
//! into a single [`Settings`] struct that is constructed once at startup and
//! passed by reference everywhere. No module-level credential globals.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// SambaNova API key
    pub sambanova_api_key: String,

    /// Chat completions API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Single owner Telegram user ID; `None` disables the access gate
    pub owner_id: Option<i64>,

    /// Sampling temperature for chat completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap; omitted from the payload when `None`
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.sambanova.ai/v1".to_string()
}

const fn default_temperature() -> f32 {
    0.8
}

const fn default_max_tokens() -> Option<u32> {
    Some(1500)
}

const fn default_api_timeout_secs() -> u64 {
    60
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required credential
    /// is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case.
            // ignore_empty treats empty env vars as unset.
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;

        if settings.telegram_token.is_empty() {
            return Err(ConfigError::NotFound("telegram_token".into()));
        }
        if settings.sambanova_api_key.is_empty() {
            return Err(ConfigError::NotFound("sambanova_api_key".into()));
        }

        Ok(settings)
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Maximum characters per outgoing Telegram message part
pub const REPLY_CHUNK_SIZE: usize = 4000;

// Retry configuration for the chat completions call
/// Total HTTP attempts per request (first try included)
pub const API_MAX_ATTEMPTS: usize = 3;
/// Backoff floor between attempts
pub const API_BACKOFF_MIN_SECS: u64 = 4;
/// Backoff ceiling between attempts
pub const API_BACKOFF_MAX_SECS: u64 = 10;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Tests touch the process environment, so everything lives in one
    // function to avoid races between parallel test threads.
    #[test]
    fn test_env_loading_and_defaults() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("SAMBANOVA_API_KEY", "dummy_key");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.sambanova_api_key, "dummy_key");
        assert_eq!(settings.api_base, "https://api.sambanova.ai/v1");
        assert!((settings.temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(settings.max_tokens, Some(1500));
        assert_eq!(settings.api_timeout_secs, 60);
        assert_eq!(settings.owner_id, None);

        // Owner id picked up when present
        env::set_var("OWNER_ID", "42");
        let settings = Settings::new()?;
        assert_eq!(settings.owner_id, Some(42));
        env::remove_var("OWNER_ID");

        // Empty env var treated as unset -> missing credential is an error
        env::set_var("SAMBANOVA_API_KEY", "");
        assert!(Settings::new().is_err());

        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("SAMBANOVA_API_KEY");
        Ok(())
    }
}
