//! Application configuration
//!
//! Loaded once at startup from a TOML file (`USER_SERVICE_CONFIG`, or
//! `~/.config/user-service/config.toml`). Missing file means defaults.
//! The token signing secret is only ever taken from `JWT_SECRET`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::JwtConfig;

/// Environment variable holding the shared token signing secret
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "USER_SERVICE_CONFIG";
/// Environment variable overriding `database.url`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("user-service")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for cleanup after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    /// Seconds
    pub connect_timeout: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://./users.db?mode=rwc".to_string(),
            max_connections: 10,
            connect_timeout: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Lifetime of admin tokens issued by `/login`
    pub token_lifetime_seconds: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_lifetime_seconds: 600,
        }
    }
}

impl AppConfig {
    /// Config path from `USER_SERVICE_CONFIG`, else the default location.
    pub fn resolve_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    }

    /// Load from `path` (defaults if absent) and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&raw)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.is_empty() {
                config.database.url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.token_lifetime_seconds <= 0 {
            return Err(ConfigError::Invalid(
                "security.token_lifetime_seconds must be positive".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Token configuration with the secret taken from `JWT_SECRET`.
    pub fn jwt_config(&self) -> Result<JwtConfig, ConfigError> {
        self.jwt_config_with_secret(std::env::var(JWT_SECRET_ENV).ok())
    }

    pub fn jwt_config_with_secret(&self, secret: Option<String>) -> Result<JwtConfig, ConfigError> {
        let secret = secret
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;
        Ok(JwtConfig::new(secret, self.security.token_lifetime_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.token_lifetime_seconds, 600);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[server\nport = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/user-service.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn secret_is_required() {
        let config = AppConfig::default();
        assert!(matches!(
            config.jwt_config_with_secret(None),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            config.jwt_config_with_secret(Some("   ".into())),
            Err(ConfigError::MissingSecret)
        ));

        let jwt = config
            .jwt_config_with_secret(Some("s3cret".into()))
            .unwrap();
        assert_eq!(jwt.secret, "s3cret");
        assert_eq!(jwt.token_lifetime_seconds, 600);
    }

    #[test]
    fn non_positive_lifetime_is_rejected() {
        let mut config = AppConfig::default();
        config.security.token_lifetime_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
