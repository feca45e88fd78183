use std::{
    collections::{HashMap, HashSet},
    env, fmt,
    path::Path,
    time::Duration,
};

use tracing::level_filters::LevelFilter;

use crate::{domain::RecipientId, errors::Error, Result};

/// Typed configuration, read once at startup and never mutated.
#[derive(Clone)]
pub struct Config {
    // Listening session (user account)
    pub api_id: i32,
    pub api_hash: String,
    pub user_session: String,
    pub phone_number: Option<String>,

    // Relay bot
    pub bot_token: String,
    pub target_users: Vec<RecipientId>,
    pub relay_timeout: Duration,

    pub filters: MessageFilters,

    pub log_level: LevelFilter,
}

/// Rules deciding which inbound messages get reported.
#[derive(Clone, Debug)]
pub struct MessageFilters {
    pub excluded_chats: HashSet<i64>,
    pub min_message_length: usize,
    pub include_media: bool,
    pub include_private_chats: bool,
    pub include_groups: bool,
    pub include_channels: bool,
}

impl Default for MessageFilters {
    fn default() -> Self {
        Self {
            excluded_chats: HashSet::new(),
            min_message_length: 1,
            include_media: true,
            include_private_chats: true,
            include_groups: true,
            include_channels: true,
        }
    }
}

impl Config {
    /// Load from the process environment, falling back to `./.env`.
    pub fn load() -> Result<Self> {
        Self::load_with_env_file(Path::new(".env"))
    }

    /// Process environment first, then `env_file` (if it exists).
    pub fn load_with_env_file(env_file: &Path) -> Result<Self> {
        let file_vars: HashMap<String, String> = match dotenvy::from_path_iter(env_file) {
            Ok(iter) => iter
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Config(format!("invalid {}: {e}", env_file.display())))?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {e}",
                    env_file.display()
                )))
            }
        };

        Self::from_vars(|key| env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_id = var("API_ID").and_then(non_empty);
        let api_hash = var("API_HASH").and_then(non_empty);
        let (Some(api_id), Some(api_hash)) = (api_id, api_hash) else {
            return Err(Error::Config(
                "API_ID and API_HASH must be configured".to_string(),
            ));
        };
        let api_id = api_id
            .trim()
            .parse::<i32>()
            .map_err(|_| Error::Config(format!("API_ID must be an integer, got {api_id:?}")))?;

        let Some(bot_token) = var("BOT_TOKEN").and_then(non_empty) else {
            return Err(Error::Config("BOT_TOKEN must be configured".to_string()));
        };

        let user_session = var("USER_SESSION")
            .and_then(non_empty)
            .unwrap_or_else(|| "user_bot".to_string());
        let phone_number = var("PHONE_NUMBER").and_then(non_empty);

        let mut target_users: Vec<RecipientId> = Vec::new();
        for id in parse_csv_i64("TARGET_USERS", var("TARGET_USERS"))? {
            let id = RecipientId(id);
            if !target_users.contains(&id) {
                target_users.push(id);
            }
        }

        let relay_timeout = match parse_num("RELAY_TIMEOUT_SECS", var("RELAY_TIMEOUT_SECS"))? {
            Some(0) => {
                return Err(Error::Config(
                    "RELAY_TIMEOUT_SECS must be at least 1".to_string(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(30),
        };

        let filters = MessageFilters {
            excluded_chats: parse_csv_i64("EXCLUDED_CHATS", var("EXCLUDED_CHATS"))?
                .into_iter()
                .collect(),
            min_message_length: parse_num("MIN_MESSAGE_LENGTH", var("MIN_MESSAGE_LENGTH"))?
                .unwrap_or(1),
            include_media: parse_bool(var("INCLUDE_MEDIA")).unwrap_or(true),
            include_private_chats: parse_bool(var("INCLUDE_PRIVATE_CHATS")).unwrap_or(true),
            include_groups: parse_bool(var("INCLUDE_GROUPS")).unwrap_or(true),
            include_channels: parse_bool(var("INCLUDE_CHANNELS")).unwrap_or(true),
        };

        let log_level = match var("LOG_LEVEL").and_then(non_empty) {
            Some(raw) => parse_log_level(&raw)?,
            None => LevelFilter::INFO,
        };

        Ok(Self {
            api_id,
            api_hash,
            user_session,
            phone_number,
            bot_token,
            target_users,
            relay_timeout,
            filters,
            log_level,
        })
    }

    /// File the listening session persists its authorization to.
    pub fn session_file(&self) -> String {
        format!("{}.session", self.user_session)
    }
}

// Credentials stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("user_session", &self.user_session)
            .field("phone_number", &self.phone_number.as_ref().map(|_| "<redacted>"))
            .field("bot_token", &"<redacted>")
            .field("target_users", &self.target_users)
            .field("relay_timeout", &self.relay_timeout)
            .field("filters", &self.filters)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Accepts `WARNING` and `CRITICAL` as well as tracing's own level names.
pub fn parse_log_level(raw: &str) -> Result<LevelFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(Error::Config(format!("unknown LOG_LEVEL: {raw}"))),
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.and_then(non_empty).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(key: &str, v: Option<String>) -> Result<Option<T>> {
    let Some(raw) = v.and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn parse_csv_i64(key: &str, v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("{key} contains a non-numeric id: {s:?}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
