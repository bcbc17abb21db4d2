//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default JSON pointer to the record array inside the fetched document.
pub const DEFAULT_RECORDS_POINTER: &str = "/records";

/// Keywords recognized regardless of the conversation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    /// Starts the questionnaire from idle.
    pub start: String,
    /// Clears everything and re-asks the first question.
    pub reset: String,
    /// Clears everything and goes back to idle.
    pub stop: String,
    /// Shows the next match while browsing results.
    pub next: String,
    /// Ends browsing.
    pub done: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            start: "開始".to_string(),
            reset: "重新開始".to_string(),
            stop: "結束".to_string(),
            next: "繼續".to_string(),
            done: "不用了".to_string(),
        }
    }
}

/// Conversation behavior, independent of any transport.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub keywords: Keywords,
    /// Pause between consecutive outbound messages to the same user.
    pub message_delay: Duration,
    /// Sessions idle longer than this are pruned.
    pub session_idle_timeout: Duration,
    /// How often the prune ticker runs.
    pub prune_interval: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            keywords: Keywords::default(),
            message_delay: Duration::from_millis(1000),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(300),        // 5 minutes
        }
    }
}

/// Where the listing dataset comes from.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub url: String,
    /// JSON pointer to the record array, e.g. `/result/records`.
    pub records_pointer: String,
    /// Optional request timeout. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

/// Messenger Send API credentials.
#[derive(Debug, Clone)]
pub struct MessengerConfig {
    pub page_token: SecretString,
    /// Token echoed back during the webhook verification handshake.
    pub verify_token: String,
    pub api_base: String,
}

/// Full bot configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub port: u16,
    pub dataset: DatasetConfig,
    pub messenger: Option<MessengerConfig>,
    pub conversation: ConversationConfig,
}

impl BotConfig {
    /// Build configuration from `RENT_BOT_*` and `MESSENGER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("RENT_BOT_DATASET_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("RENT_BOT_DATASET_URL".to_string()))?;

        let records_pointer = lookup("RENT_BOT_RECORDS_POINTER")
            .unwrap_or_else(|| DEFAULT_RECORDS_POINTER.to_string());
        if !records_pointer.is_empty() && !records_pointer.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "RENT_BOT_RECORDS_POINTER".to_string(),
                message: format!("'{records_pointer}' is not a JSON pointer"),
            });
        }

        let port: u16 = parse_or(&lookup, "RENT_BOT_PORT", 8080)?;
        let delay_ms: u64 = parse_or(&lookup, "RENT_BOT_MESSAGE_DELAY_MS", 1000)?;
        let idle_secs: u64 = parse_or(&lookup, "RENT_BOT_SESSION_IDLE_SECS", 3600)?;
        let fetch_timeout = match lookup("RENT_BOT_FETCH_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value(
                "RENT_BOT_FETCH_TIMEOUT_SECS",
                &raw,
            )?)),
            None => None,
        };

        let defaults = Keywords::default();
        let keywords = Keywords {
            start: lookup("RENT_BOT_START_KEYWORD").unwrap_or(defaults.start),
            reset: lookup("RENT_BOT_RESET_KEYWORD").unwrap_or(defaults.reset),
            stop: lookup("RENT_BOT_STOP_KEYWORD").unwrap_or(defaults.stop),
            next: lookup("RENT_BOT_NEXT_KEYWORD").unwrap_or(defaults.next),
            done: lookup("RENT_BOT_DONE_KEYWORD").unwrap_or(defaults.done),
        };

        let messenger = lookup("MESSENGER_PAGE_TOKEN").map(|token| MessengerConfig {
            page_token: SecretString::from(token),
            verify_token: lookup("MESSENGER_VERIFY_TOKEN").unwrap_or_default(),
            api_base: lookup("MESSENGER_API_BASE")
                .unwrap_or_else(|| "https://graph.facebook.com/v19.0".to_string()),
        });

        Ok(Self {
            port,
            dataset: DatasetConfig {
                url,
                records_pointer,
                fetch_timeout,
            },
            messenger,
            conversation: ConversationConfig {
                keywords,
                message_delay: Duration::from_millis(delay_ms),
                session_idle_timeout: Duration::from_secs(idle_secs),
                ..ConversationConfig::default()
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
