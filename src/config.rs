//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::relay::RelayConfig;
use crate::websocket::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub negotiation: NegotiationConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL, used in negotiated client URLs
    #[serde(default)]
    pub public_url: Option<String>,

    /// Origins allowed to call `/negotiate`; empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7071
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to reach this server
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = match self.host.as_str() {
                    "0.0.0.0" | "::" => "localhost",
                    other => other,
                };
                format!("http://{}:{}", host, self.port)
            }
        }
    }
}

/// Connection negotiation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NegotiationConfig {
    /// Key signing client and service access tokens
    #[serde(default)]
    pub access_key: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    3600
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl NegotiationConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Where relayed events are published
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// In-process WebSocket hub
    #[default]
    Local,
    /// External realtime messaging service
    Service,
}

impl std::str::FromStr for BroadcastMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BroadcastMode::Local),
            "service" => Ok(BroadcastMode::Service),
            other => Err(ConfigError::Invalid(format!("Unknown broadcast mode: {}", other))),
        }
    }
}

impl std::fmt::Display for BroadcastMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BroadcastMode::Local => write!(f, "local"),
            BroadcastMode::Service => write!(f, "service"),
        }
    }
}

/// Broadcast backend configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default)]
    pub mode: BroadcastMode,

    /// Realtime service endpoint, required in `service` mode
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// The first file that exists is used. A file that exists but cannot be
    /// read or parsed is an error, not a fallback to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("beacon").join("config.toml")),
            Some(PathBuf::from("/etc/beacon/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        Self::load_first(config_paths.iter().flatten())
    }

    fn load_first<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Result<Self, ConfigError> {
        for path in paths {
            if path.exists() {
                let config = Self::load_with_env(path)?;
                tracing::info!("Loaded config from {:?}", path);
                return Ok(config);
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Check settings that would otherwise fail at request time
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.channel_name.trim().is_empty() {
            return Err(ConfigError::Invalid("relay.channel_name cannot be empty".into()));
        }
        if self.relay.negotiation_channel_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "relay.negotiation_channel_name cannot be empty".into(),
            ));
        }
        if self.relay.event_target.trim().is_empty() {
            return Err(ConfigError::Invalid("relay.event_target cannot be empty".into()));
        }
        if self.relay.body_read_timeout_ms == 0 || self.relay.publish_timeout_ms == 0 {
            return Err(ConfigError::Invalid("relay timeouts must be greater than zero".into()));
        }
        if self.negotiation.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "negotiation.token_ttl_secs must be greater than zero".into(),
            ));
        }
        if self.broadcast.mode == BroadcastMode::Service {
            if self.broadcast.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
                return Err(ConfigError::Invalid(
                    "broadcast.endpoint is required in service mode".into(),
                ));
            }
            if self.negotiation.access_key.is_empty() {
                return Err(ConfigError::Invalid(
                    "negotiation.access_key is required in service mode".into(),
                ));
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Server overrides
        if let Some(host) = var("BEACON_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("BEACON_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("BEACON_PORT is not a valid port: {}", port)))?;
        }
        if let Some(url) = var("BEACON_PUBLIC_URL") {
            self.server.public_url = Some(url);
        }

        // Relay overrides
        if let Some(channel) = var("BEACON_CHANNEL") {
            self.relay.channel_name = channel.clone();
            self.relay.negotiation_channel_name = channel;
        }

        // Negotiation / broadcast overrides
        if let Some(key) = var("BEACON_ACCESS_KEY") {
            self.negotiation.access_key = key;
        }
        if let Some(mode) = var("BEACON_BROADCAST_MODE") {
            self.broadcast.mode = mode.parse()?;
        }
        if let Some(endpoint) = var("BEACON_SERVICE_ENDPOINT") {
            self.broadcast.endpoint = Some(endpoint);
        }

        // Logging overrides
        if let Some(level) = var("BEACON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("BEACON_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Beacon Configuration
#
# Environment variables override these settings:
# - BEACON_HOST
# - BEACON_PORT
# - BEACON_PUBLIC_URL
# - BEACON_CHANNEL
# - BEACON_ACCESS_KEY
# - BEACON_BROADCAST_MODE
# - BEACON_SERVICE_ENDPOINT
# - BEACON_LOG_LEVEL
# - BEACON_LOG_FORMAT

[server]
host = "0.0.0.0"
port = 7071

# Base URL clients reach this server on (default: http://<host>:<port>)
# public_url = "https://beacon.example.com"

# Origins allowed to call /negotiate (empty = any)
cors_origins = []

[relay]
# Hub that delivered events are published to
channel_name = "cloudEventSchemaHub"

# Hub that /negotiate issues credentials for
negotiation_channel_name = "cloudEventSchemaHub"

# Client method invoked with each event
event_target = "newEvent"

# Maximum event body size (bytes)
max_body_size = 1048576

body_read_timeout_ms = 10000
publish_timeout_ms = 5000

# Answer methods other than OPTIONS/POST on /cloudevents with 405
reject_unhandled_methods = false

# WebHook-Allowed-Rate returned to validation probes that ask for one
# allowed_rate = "*"

[hub]
# Maximum concurrent WebSocket clients (local mode)
max_connections = 1000

[negotiation]
# Signing key for access tokens; a random key is generated in local mode
# when empty
access_key = ""

token_ttl_secs = 3600

[broadcast]
# local: in-process WebSocket hub
# service: external realtime service REST API
mode = "local"

# endpoint = "https://myhub.service.example.com"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 7071);
        assert_eq!(config.relay.channel_name, "cloudEventSchemaHub");
        assert_eq!(config.relay.negotiation_channel_name, "cloudEventSchemaHub");
        assert_eq!(config.relay.event_target, "newEvent");
        assert_eq!(config.broadcast.mode, BroadcastMode::Local);
        assert!(!config.relay.reject_unhandled_methods);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.relay.max_body_size, 1024 * 1024);
        assert_eq!(config.hub.max_connections, 1000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[relay]
channel_name = "orders"
reject_unhandled_methods = true

[broadcast]
mode = "service"
endpoint = "https://hub.example.com"

[negotiation]
access_key = "secret"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.relay.channel_name, "orders");
        assert_eq!(config.relay.negotiation_channel_name, "cloudEventSchemaHub");
        assert!(config.relay.reject_unhandled_methods);
        assert_eq!(config.broadcast.mode, BroadcastMode::Service);
        assert_eq!(config.server.port, 7071);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/beacon.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relay\nchannel_name = ").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_broken_config_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[broadcast]\nmode = ").unwrap();

        let paths = [
            PathBuf::from("/nonexistent/beacon.toml"),
            file.path().to_path_buf(),
        ];
        let result = Config::load_first(paths.iter());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_first_existing_config_file_wins() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        writeln!(first, "[relay]\nchannel_name = \"first\"").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        writeln!(second, "[relay]\nchannel_name = \"second\"").unwrap();

        let paths = [
            PathBuf::from("/nonexistent/beacon.toml"),
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ];
        let config = Config::load_first(paths.iter()).unwrap();
        assert_eq!(config.relay.channel_name, "first");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BEACON_PORT", "8080"),
            ("BEACON_CHANNEL", "orders"),
            ("BEACON_BROADCAST_MODE", "service"),
            ("BEACON_SERVICE_ENDPOINT", "https://hub.example.com"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.relay.channel_name, "orders");
        assert_eq!(config.relay.negotiation_channel_name, "orders");
        assert_eq!(config.broadcast.mode, BroadcastMode::Service);
        assert_eq!(config.broadcast.endpoint.as_deref(), Some("https://hub.example.com"));
    }

    #[test]
    fn test_invalid_env_overrides_are_errors() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "BEACON_BROADCAST_MODE").then(|| "kafka".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        assert_eq!(config.broadcast.mode, BroadcastMode::Local);

        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "BEACON_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_service_mode_requires_endpoint_and_key() {
        let mut config = Config::default();
        config.broadcast.mode = BroadcastMode::Service;
        assert!(config.validate().is_err());

        config.broadcast.endpoint = Some("https://hub.example.com".to_string());
        assert!(config.validate().is_err());

        config.negotiation.access_key = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_channel_is_invalid() {
        let mut config = Config::default();
        config.relay.channel_name = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_public_base_url() {
        let mut server = ServerConfig::default();
        assert_eq!(server.public_base_url(), "http://localhost:7071");

        server.host = "127.0.0.1".to_string();
        assert_eq!(server.public_base_url(), "http://127.0.0.1:7071");

        server.public_url = Some("https://beacon.example.com/".to_string());
        assert_eq!(server.public_base_url(), "https://beacon.example.com");
    }

    #[test]
    fn test_broadcast_mode_from_str() {
        assert_eq!("LOCAL".parse::<BroadcastMode>().unwrap(), BroadcastMode::Local);
        assert_eq!("service".parse::<BroadcastMode>().unwrap(), BroadcastMode::Service);
        assert!("kafka".parse::<BroadcastMode>().is_err());
    }
}
