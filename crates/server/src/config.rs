//! Server configuration loaded from environment variables.
//!
//! Every external integration is optional. When its variables are absent the
//! server falls back to the in-process demo implementation of that concern.
//!
//! # Environment Variables
//!
//! ## Server
//! - `SHIFTDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `SHIFTDESK_PORT` - Listen port (default: 3000)
//! - `SHIFTDESK_BASE_URL` - Public URL used in personal user links (default: <http://localhost:3000>)
//! - `SHIFTDESK_LOG_JSON` - Emit JSON logs when set
//!
//! ## Notion (enables the live shift store; both or neither)
//! - `NOTION_TOKEN` - Internal integration token
//! - `NOTION_DATABASE_ID` - Shift database ID
//!
//! ## Discord (enables chat notifications; both or neither)
//! - `DISCORD_BOT_TOKEN` - Bot token
//! - `DISCORD_CHANNEL_ID` - Channel receiving booking notifications
//!
//! ## SMTP (enables email notifications; host, username, password and from together)
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`
//! - `SMTP_PORT` - default 587
//!
//! ## Google Calendar (client id and secret together)
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`
//! - `GOOGLE_REDIRECT_URI` - default `{SHIFTDESK_BASE_URL}/auth/google/callback`
//! - `CALENDAR_TIME_ZONE` - default `Europe/Rome`
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Shiftdesk server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to build personal user links
    pub base_url: String,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Notion shift database (live store when present)
    pub notion: Option<NotionConfig>,
    /// Discord bot (live chat notifications when present)
    pub discord: Option<DiscordConfig>,
    /// SMTP relay (live email notifications when present)
    pub email: Option<EmailConfig>,
    /// Google OAuth client (live calendar invites when present)
    pub google: Option<GoogleConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Notion API configuration.
#[derive(Clone)]
pub struct NotionConfig {
    /// Integration token
    pub token: SecretString,
    /// Shift database ID
    pub database_id: String,
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("token", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .finish()
    }
}

/// Discord bot configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token
    pub bot_token: SecretString,
    /// Channel that receives booking and cancellation embeds
    pub channel_id: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Google OAuth client used for calendar invites.
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Redirect URI registered with Google
    pub redirect_uri: String,
    /// IANA time zone for created events
    pub time_zone: String,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value fails to parse or if only part of an
    /// integration's variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SHIFTDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHIFTDESK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHIFTDESK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHIFTDESK_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("SHIFTDESK_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHIFTDESK_BASE_URL".to_string(), e.to_string())
        })?;
        let log_json = get_optional_env("SHIFTDESK_LOG_JSON").is_some();

        let notion = NotionConfig::from_env()?;
        let discord = DiscordConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let google = GoogleConfig::from_env(&base_url)?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            base_url,
            log_json,
            notion,
            discord,
            email,
            google,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// A configuration with every integration disabled.
    ///
    /// Selects the demo store and demo notifiers; used by tests and tools.
    #[must_use]
    pub fn offline(base_url: impl Into<String>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: base_url.into(),
            log_json: false,
            notion: None,
            discord: None,
            email: None,
            google: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Personal link for a registered user.
    #[must_use]
    pub fn user_link(&self, user_id: &impl std::fmt::Display) -> String {
        format!("{}/user/{user_id}", self.base_url)
    }
}

impl NotionConfig {
    /// Load Notion configuration from environment.
    ///
    /// Returns `None` if neither variable is set (demo store).
    ///
    /// # Errors
    ///
    /// Returns an error if only one of the two variables is set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let token = get_optional_env("NOTION_TOKEN");
        let database_id = get_optional_env("NOTION_DATABASE_ID");

        match (token, database_id) {
            (Some(token), Some(database_id)) => {
                // Notion tokens carry a fixed "secret_"/"ntn_" prefix, so only warn
                if let Err(e) = validate_secret_strength(&token, "NOTION_TOKEN") {
                    tracing::warn!("NOTION_TOKEN validation warning: {e}");
                }
                Ok(Some(Self {
                    token: SecretString::from(token),
                    database_id,
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "NOTION_*".to_string(),
                "Both NOTION_TOKEN and NOTION_DATABASE_ID must be set together".to_string(),
            )),
        }
    }
}

impl DiscordConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let bot_token = get_optional_env("DISCORD_BOT_TOKEN");
        let channel_id = get_optional_env("DISCORD_CHANNEL_ID");

        match (bot_token, channel_id) {
            (Some(token), Some(channel_id)) => {
                if let Err(e) = validate_secret_strength(&token, "DISCORD_BOT_TOKEN") {
                    tracing::warn!("DISCORD_BOT_TOKEN validation warning: {e}");
                }
                Ok(Some(Self {
                    bot_token: SecretString::from(token),
                    channel_id,
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "DISCORD_*".to_string(),
                "Both DISCORD_BOT_TOKEN and DISCORD_CHANNEL_ID must be set together".to_string(),
            )),
        }
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let host = get_optional_env("SMTP_HOST");
        let username = get_optional_env("SMTP_USERNAME");
        let password = get_optional_env("SMTP_PASSWORD");
        let from = get_optional_env("SMTP_FROM");

        let (smtp_host, smtp_username, smtp_password, from_address) =
            match (host, username, password, from) {
                (Some(h), Some(u), Some(p), Some(f)) => (h, u, p, f),
                (None, None, None, None) => return Ok(None),
                _ => {
                    return Err(ConfigError::InvalidEnvVar(
                        "SMTP_*".to_string(),
                        "SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD and SMTP_FROM must be set together"
                            .to_string(),
                    ));
                }
            };

        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        if let Err(e) = validate_secret_strength(&smtp_password, "SMTP_PASSWORD") {
            tracing::warn!("SMTP_PASSWORD validation warning: {e}");
        }

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password: SecretString::from(smtp_password),
            from_address,
        }))
    }
}

impl GoogleConfig {
    fn from_env(base_url: &str) -> Result<Option<Self>, ConfigError> {
        let client_id = get_optional_env("GOOGLE_CLIENT_ID");
        let client_secret = get_optional_env("GOOGLE_CLIENT_SECRET");

        match (client_id, client_secret) {
            (Some(client_id), Some(secret)) => {
                validate_secret_strength(&secret, "GOOGLE_CLIENT_SECRET")?;
                Ok(Some(Self {
                    client_id,
                    client_secret: SecretString::from(secret),
                    redirect_uri: get_env_or_default(
                        "GOOGLE_REDIRECT_URI",
                        &format!("{base_url}/auth/google/callback"),
                    ),
                    time_zone: get_env_or_default("CALENDAR_TIME_ZONE", "Europe/Rome"),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "GOOGLE_*".to_string(),
                "Both GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together".to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-client-secret", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("GOCSPX-9fK2mQx7LbZ1vR4tNw8yHc3", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_offline_config_has_no_integrations() {
        let config = ServerConfig::offline("http://localhost:3000");
        assert!(config.notion.is_none());
        assert!(config.discord.is_none());
        assert!(config.email.is_none());
        assert!(config.google.is_none());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_user_link() {
        let config = ServerConfig::offline("https://turni.example.org");
        assert_eq!(
            config.user_link(&"abc"),
            "https://turni.example.org/user/abc"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let notion = NotionConfig {
            token: SecretString::from("ntn_super_secret_token_value"),
            database_id: "db-123".to_string(),
        };
        let discord = DiscordConfig {
            bot_token: SecretString::from("discord_super_secret_token"),
            channel_id: "998877".to_string(),
        };
        let email = EmailConfig {
            smtp_host: "smtp.example.org".to_string(),
            smtp_port: 587,
            smtp_username: "turni".to_string(),
            smtp_password: SecretString::from("smtp_super_secret_password"),
            from_address: "turni@example.org".to_string(),
        };
        let google = GoogleConfig {
            client_id: "client-id-value".to_string(),
            client_secret: SecretString::from("google_super_secret_value"),
            redirect_uri: "http://localhost:3000/auth/google/callback".to_string(),
            time_zone: "Europe/Rome".to_string(),
        };

        let output = format!("{notion:?} {discord:?} {email:?} {google:?}");

        assert!(output.contains("db-123"));
        assert!(output.contains("998877"));
        assert!(output.contains("smtp.example.org"));
        assert!(output.contains("client-id-value"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super_secret"));
    }
}
