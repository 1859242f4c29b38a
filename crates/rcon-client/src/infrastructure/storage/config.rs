//! TOML configuration for the `rcon-client` binary.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 2306
//! password = "secret"
//!
//! [session]
//! keepalive_interval_ms = 3000
//! login_timeout_ms = 5000
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! Every field except `server.password` has a serde default, so a file that
//! only sets the password is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::client::RconConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config parsed but holds a value the client cannot use.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which server to talk to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub password: String,
}

/// Session timings, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    #[serde(default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    2306
}
fn default_keepalive_interval_ms() -> u64 {
    3000
}
fn default_login_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_ms: default_keepalive_interval_ms(),
            login_timeout_ms: default_login_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Loading and saving ────────────────────────────────────────────────────────

impl ClientConfig {
    /// A config for one server with default session and logging settings.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: host.into(),
                port,
                password: password.into(),
            },
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// The file `rcon-client --init` writes: the default server address and
    /// a placeholder password.
    pub fn starter() -> Self {
        Self::new(default_host(), default_port(), "changeme")
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or a missing password,
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the config file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Writes the config to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] for file-system failures or
    /// [`ConfigError::Serialize`] if serialization fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Renders the config as pretty-printed TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.session.keepalive_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "session.keepalive_interval_ms must be greater than 0".into(),
            ));
        }
        if self.session.login_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "session.login_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Connection parameters for [`connect`](crate::infrastructure::network::connect).
    pub fn to_rcon_config(&self) -> RconConfig {
        RconConfig::new(
            self.server.host.clone(),
            self.server.port,
            self.server.password.clone(),
        )
        .with_keepalive_interval(Duration::from_millis(self.session.keepalive_interval_ms))
        .with_login_timeout(Duration::from_millis(self.session.login_timeout_ms))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("rcon_client_test_{}_{name}", std::process::id()))
            .join("rcon.toml")
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        // Arrange
        let toml_str = r#"
[server]
password = "secret"
"#;

        // Act
        let cfg = ClientConfig::from_toml_str(toml_str).expect("deserialize minimal");

        // Assert
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 2306);
        assert_eq!(cfg.session.keepalive_interval_ms, 3000);
        assert_eq!(cfg.session.login_timeout_ms, 5000);
        assert_eq!(cfg.logging.log_level, "info");
    }

    #[test]
    fn test_partial_session_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[server]
host = "game.example.org"
password = "secret"

[session]
keepalive_interval_ms = 1000
"#;

        // Act
        let cfg = ClientConfig::from_toml_str(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.server.host, "game.example.org");
        assert_eq!(cfg.session.keepalive_interval_ms, 1000);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.session.login_timeout_ms, 5000);
    }

    #[test]
    fn test_missing_password_returns_parse_error() {
        let result = ClientConfig::from_toml_str("[server]\nhost = \"localhost\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result = ClientConfig::from_toml_str("[[[ not valid toml");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_keepalive_interval_is_invalid() {
        // Arrange
        let toml_str = r#"
[server]
password = "secret"

[session]
keepalive_interval_ms = 0
"#;

        // Act
        let result = ClientConfig::from_toml_str(toml_str);

        // Assert
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_host_is_invalid() {
        let result = ClientConfig::from_toml_str("[server]\nhost = \" \"\npassword = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_rcon_config_carries_timings() {
        // Arrange
        let cfg = ClientConfig::from_toml_str(
            "[server]\nport = 2310\npassword = \"pw\"\n[session]\nkeepalive_interval_ms = 250\nlogin_timeout_ms = 750\n",
        )
        .unwrap();

        // Act
        let rcon = cfg.to_rcon_config();

        // Assert
        assert_eq!(rcon.host, "127.0.0.1");
        assert_eq!(rcon.port, 2310);
        assert_eq!(rcon.password, "pw");
        assert_eq!(rcon.keepalive_interval, Duration::from_millis(250));
        assert_eq!(rcon.login_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_load_missing_file_returns_io_error_with_path() {
        // Arrange
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/rcon.toml");

        // Act
        let result = ClientConfig::load(&path);

        // Assert
        match result {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_starter_config_is_valid_and_uses_defaults() {
        // Arrange / Act
        let cfg = ClientConfig::starter();

        // Assert
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 2306);
        assert_eq!(cfg.session, SessionConfig::default());
        assert_eq!(cfg.logging.log_level, "info");
    }

    #[test]
    fn test_starter_toml_parses_back() {
        // Arrange
        let text = ClientConfig::starter().to_toml_string().unwrap();

        // Act
        let parsed = ClientConfig::from_toml_str(&text).unwrap();

        // Assert
        assert!(text.contains("[server]"));
        assert_eq!(parsed, ClientConfig::starter());
    }

    #[test]
    fn test_save_and_load_round_trip_via_temp_dir() {
        // Arrange
        let path = temp_path("round_trip");
        let mut cfg = ClientConfig::new("127.0.0.1", 2400, "secret");
        cfg.logging.log_level = "debug".to_string();

        // Act
        cfg.save(&path).unwrap();
        let loaded = ClientConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }
}
