//! Configuration resolved from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TELEGRAM_TOKEN` (or `TELEGRAM_BOT_TOKEN`) - Bot API access token
//! - `TELEGRAM_CHAT_ID` (or `TELEGRAM_TO`) - Target chat identifier
//!
//! ## Optional
//! - `TELEGRAM_API_URL` - Bot API base URL (default: https://api.telegram.org)
//! - `CI_NOTIFY_PROFILE` - Built-in CI variable profile: multi, github, gitlab (default: multi)
//! - `CI_NOTIFY_CONFIG` - TOML file overriding the CI variable profile
//! - `CI_NOTIFY_LOG_FILE` - Append-only log file (default: cibot.log)
//! - `METRICS_HOST` - Metrics bind host, IP literal or hostname (default: 0.0.0.0)
//! - `METRICS_PORT` - Metrics listen port (default: 8000)
//!
//! All lookups go through a `Fn(&str) -> Option<String>` so callers can resolve
//! against something other than the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use tracing::error;

use crate::ci::EnvProfile;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_LOG_FILE: &str = "cibot.log";
pub const DEFAULT_METRICS_HOST: &str = "0.0.0.0";
pub const DEFAULT_METRICS_PORT: u16 = 8000;

pub const TOKEN_VARS: &[&str] = &["TELEGRAM_TOKEN", "TELEGRAM_BOT_TOKEN"];
pub const CHAT_ID_VARS: &[&str] = &["TELEGRAM_CHAT_ID", "TELEGRAM_TO"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: one of {}", .0.join(", "))]
    MissingCredential(&'static [&'static str]),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Unknown environment profile: {0}")]
    UnknownProfile(String),
    #[error("Unknown CI field in profile file: {0}")]
    UnknownField(String),
    #[error("Failed to read profile file {path}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse profile file {path}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Lookup against the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// First non-empty value among `candidates`, tried in order.
pub fn resolve_var<S, F>(candidates: &[S], lookup: &F) -> Option<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    candidates
        .iter()
        .filter_map(|name| lookup(name.as_ref()))
        .find(|value| !value.is_empty())
}

/// Notification client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct NotifierConfig {
    /// Bot API access token
    pub token: SecretString,
    /// Target chat identifier
    pub chat_id: String,
    /// Bot API base URL, without trailing slash
    pub api_url: String,
    /// Which variables feed each CI field
    pub profile: EnvProfile,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("profile", &self.profile.name())
            .finish()
    }
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    /// Credentials are checked before anything else, so a missing token or
    /// chat id is reported regardless of the rest of the environment.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = resolve_var(TOKEN_VARS, lookup);
        let chat_id = resolve_var(CHAT_ID_VARS, lookup);

        let (token, chat_id) = match (token, chat_id) {
            (Some(token), Some(chat_id)) => (token, chat_id),
            (token, _) => {
                error!("TELEGRAM_TOKEN and/or TELEGRAM_CHAT_ID are not set");
                let missing = if token.is_none() {
                    TOKEN_VARS
                } else {
                    CHAT_ID_VARS
                };
                return Err(ConfigError::MissingCredential(missing));
            }
        };

        let api_url = resolve_var(&["TELEGRAM_API_URL"], lookup)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let profile = EnvProfile::from_lookup(lookup)?;

        Ok(Self {
            token: SecretString::from(token),
            chat_id,
            api_url,
            profile,
        })
    }
}

pub fn log_file<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(
        resolve_var(&["CI_NOTIFY_LOG_FILE"], lookup)
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
    )
}

/// Address for the metrics exposition endpoint. Hostnames are resolved and
/// the first address returned is used.
pub async fn metrics_addr<F>(lookup: &F) -> Result<SocketAddr, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = resolve_var(&["METRICS_HOST"], lookup)
        .unwrap_or_else(|| DEFAULT_METRICS_HOST.to_string());
    let port = match resolve_var(&["METRICS_PORT"], lookup) {
        Some(port) => port
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("METRICS_PORT".to_string(), e.to_string()))?,
        None => DEFAULT_METRICS_PORT,
    };

    let invalid_host =
        |reason: String| ConfigError::InvalidEnvVar("METRICS_HOST".to_string(), reason);
    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| invalid_host(e.to_string()))?
        .next()
        .ok_or_else(|| invalid_host(format!("{host} resolved to no addresses")));
    addr
}

#[cfg(test)]
pub(crate) fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}
