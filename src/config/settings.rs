// src/config/settings.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_PATH;

pub const DEFAULT_PORTAL_URL: &str = "https://online.deu.edu.tr/portal";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_NOTIFY_DELAY_MS: u64 = 1000;

/// Everything a run needs, read once at startup and passed down by reference.
#[derive(Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub telegram_api_base: String,
    pub portal_url: Url,
    pub portal_username: String,
    pub portal_password: String,
    /// Kept for deployments that drive a browser; the HTTP collector is always headless.
    pub headless: bool,
    /// Scan the whole portal page when the alert feed yields nothing.
    pub allow_page_search: bool,
    pub history_path: PathBuf,
    /// Pause between two consecutive outgoing notifications.
    pub notify_delay: Duration,
}

impl Config {
    /// Read from the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Values are trimmed; empty counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let telegram_token = required("TELEGRAM_TOKEN")?;
        let telegram_chat_id = required("TELEGRAM_CHAT_ID")?;
        let portal_username = required("SAKAI_USERNAME")?;
        let portal_password = required("SAKAI_PASSWORD")?;

        let raw_url = get("SAKAI_URL").unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string());
        let portal_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: "SAKAI_URL",
            reason: e.to_string(),
        })?;
        if !matches!(portal_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "SAKAI_URL",
                reason: format!("unsupported scheme {}", portal_url.scheme()),
            });
        }

        let notify_delay = match get("NOTIFY_DELAY_MS") {
            Some(v) => v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "NOTIFY_DELAY_MS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_NOTIFY_DELAY_MS,
        };

        Ok(Self {
            telegram_token,
            telegram_chat_id,
            telegram_api_base: get("TELEGRAM_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API.to_string()),
            portal_url,
            portal_username,
            portal_password,
            headless: get("HEADLESS").is_some_and(|v| parse_flag(&v)),
            allow_page_search: get("ALLOW_PAGE_SEARCH").is_some_and(|v| parse_flag(&v)),
            history_path: get("ANNOUNCEMENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH)),
            notify_delay: Duration::from_millis(notify_delay),
        })
    }
}

/// `1`, `true` and `yes` (any case) switch a flag on.
pub fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

// Secrets stay out of logs: only their lengths are shown.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token_len", &self.telegram_token.len())
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("portal_url", &self.portal_url.as_str())
            .field("portal_username", &self.portal_username)
            .field("portal_password_len", &self.portal_password.len())
            .field("headless", &self.headless)
            .field("allow_page_search", &self.allow_page_search)
            .field("history_path", &self.history_path)
            .field("notify_delay", &self.notify_delay)
            .finish()
    }
}
