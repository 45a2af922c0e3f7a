//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub hub: HubConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Server bind configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Event hub tuning
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Maximum concurrent connections, `None` for unbounded
    #[serde(default = "default_max_connections")]
    pub max_connections: Option<usize>,
    /// Upper bound for a single enqueue onto a connection's outbound queue
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Close connections that have not pinged within this window
    #[serde(default)]
    pub heartbeat_timeout_ms: Option<u64>,
    /// Text of the `connected` acknowledgment
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

impl HubConfig {
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    #[must_use]
    pub fn heartbeat_timeout(&self) -> Option<Duration> {
        self.heartbeat_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            send_timeout_ms: default_send_timeout_ms(),
            outbound_buffer: default_outbound_buffer(),
            heartbeat_timeout_ms: None,
            welcome_message: default_welcome_message(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "cctv-backend".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_connections() -> Option<usize> {
    Some(10_000)
}

fn default_send_timeout_ms() -> u64 {
    3_000
}

fn default_outbound_buffer() -> usize {
    100
}

fn default_welcome_message() -> String {
    "Connected to CCTV monitoring events".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

/// Parse an optional variable, rejecting values that are present but malformed
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("APP_ENV") {
            None => Environment::default(),
            Some(raw) => match raw.to_lowercase().as_str() {
                "production" => Environment::Production,
                "staging" => Environment::Staging,
                "development" => Environment::Development,
                _ => return Err(ConfigError::InvalidValue("APP_ENV", raw)),
            },
        };

        // 0 disables the connection ceiling
        let max_connections = match parse_var::<usize>(&lookup, "HUB_MAX_CONNECTIONS")? {
            None => default_max_connections(),
            Some(0) => None,
            Some(n) => Some(n),
        };

        let outbound_buffer = parse_var(&lookup, "HUB_OUTBOUND_BUFFER")?
            .unwrap_or_else(default_outbound_buffer);
        if outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue("HUB_OUTBOUND_BUFFER", "0".to_string()));
        }

        let heartbeat_timeout_ms = parse_var::<u64>(&lookup, "HUB_HEARTBEAT_TIMEOUT_MS")?;
        if heartbeat_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue("HUB_HEARTBEAT_TIMEOUT_MS", "0".to_string()));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: environment,
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port: parse_var(&lookup, "GATEWAY_PORT")?.unwrap_or_else(default_port),
            },
            hub: HubConfig {
                max_connections,
                send_timeout_ms: parse_var(&lookup, "HUB_SEND_TIMEOUT_MS")?
                    .unwrap_or_else(default_send_timeout_ms),
                outbound_buffer,
                heartbeat_timeout_ms,
                welcome_message: lookup("HUB_WELCOME_MESSAGE")
                    .unwrap_or_else(default_welcome_message),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|s| s.split(',').map(str::trim).map(String::from).collect())
                    .unwrap_or_else(default_allowed_origins),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
