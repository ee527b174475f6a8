//! Configuration loading
//!
//! Resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The binary's clap parser covers levels 1 and 2 (every flag has an `env`
//! fallback) and hands them over as a [`ConfigLayer`]; the TOML file is a
//! second layer; [`Config::resolve`] fills whatever is left from defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Origins accepted by CORS when running in development
pub const DEV_CORS_ORIGINS: [&str; 2] = ["http://localhost:3001", "http://127.0.0.1:3001"];

/// Value of `database_path` that selects a throwaway in-memory store
pub const IN_MEMORY_DATABASE: &str = ":memory:";

// ========================================
// Environment
// ========================================

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!(
                "Unknown environment '{}' (expected development or production)",
                other
            ))),
        }
    }
}

// ========================================
// Layers
// ========================================

/// Outgoing mail settings of a single layer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailLayer {
    pub service: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_secure: Option<bool>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// One source of configuration values; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<String>,
    pub environment: Option<Environment>,
    pub jwt_secret: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub upload_root: Option<PathBuf>,
    pub static_root: Option<PathBuf>,
    pub cors_origins: Option<Vec<String>>,
    #[serde(default)]
    pub email: EmailLayer,
}

impl EmailLayer {
    fn or(self, lower: EmailLayer) -> EmailLayer {
        EmailLayer {
            service: self.service.or(lower.service),
            smtp_host: self.smtp_host.or(lower.smtp_host),
            smtp_port: self.smtp_port.or(lower.smtp_port),
            smtp_secure: self.smtp_secure.or(lower.smtp_secure),
            user: self.user.or(lower.user),
            pass: self.pass.or(lower.pass),
            from: self.from.or(lower.from),
            to: self.to.or(lower.to),
        }
    }
}

impl ConfigLayer {
    /// Fill unset keys of `self` from a lower-priority layer
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
            database_path: self.database_path.or(lower.database_path),
            environment: self.environment.or(lower.environment),
            jwt_secret: self.jwt_secret.or(lower.jwt_secret),
            admin_username: self.admin_username.or(lower.admin_username),
            admin_password: self.admin_password.or(lower.admin_password),
            upload_root: self.upload_root.or(lower.upload_root),
            static_root: self.static_root.or(lower.static_root),
            cors_origins: self.cors_origins.or(lower.cors_origins),
            email: self.email.or(lower.email),
        }
    }
}

// ========================================
// Resolved configuration
// ========================================

/// Resolved outgoing mail settings
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    /// Well-known provider shortcut ("gmail"); generic SMTP otherwise
    pub service: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl EmailConfig {
    /// Mail is sent only when both credentials are present
    pub fn is_configured(&self) -> bool {
        non_empty(&self.user) && non_empty(&self.pass)
    }

    /// Sender address (falls back to the SMTP user)
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.user.as_deref())
    }

    /// Label inbox that receives notifications (falls back to the SMTP user)
    pub fn recipient(&self) -> Option<&str> {
        self.to.as_deref().or(self.user.as_deref())
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file; `None` selects an in-memory store
    pub database_path: Option<PathBuf>,
    pub environment: Environment,
    /// Admin token signing secret
    pub jwt_secret: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    pub upload_root: PathBuf,
    pub static_root: PathBuf,
    /// Allowed CORS origins in production
    pub cors_origins: Vec<String>,
    pub email: EmailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config::resolve(ConfigLayer::default())
    }
}

impl Config {
    /// Build the final configuration from merged layers plus defaults
    pub fn resolve(layer: ConfigLayer) -> Config {
        let database_path = match layer.database_path.as_deref() {
            Some(IN_MEMORY_DATABASE) => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(default_database_path()),
        };

        let email = layer.email;
        Config {
            host: layer.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: layer.port.unwrap_or(3000),
            database_path,
            environment: layer.environment.unwrap_or_default(),
            jwt_secret: layer.jwt_secret.filter(|s| !s.trim().is_empty()),
            admin_username: layer.admin_username.unwrap_or_else(|| "admin".to_string()),
            admin_password: layer.admin_password.unwrap_or_else(|| "admin123".to_string()),
            upload_root: layer.upload_root.unwrap_or_else(|| PathBuf::from("uploads")),
            static_root: layer.static_root.unwrap_or_else(|| PathBuf::from("public")),
            cors_origins: layer.cors_origins.unwrap_or_default(),
            email: EmailConfig {
                service: email.service.filter(|s| !s.trim().is_empty()),
                smtp_host: email.smtp_host.unwrap_or_else(|| "localhost".to_string()),
                smtp_port: email.smtp_port.unwrap_or(587),
                smtp_secure: email.smtp_secure.unwrap_or(false),
                user: email.user,
                pass: email.pass,
                from: email.from,
                to: email.to,
            },
        }
    }

    /// Reject configurations that must not be served
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if !self.environment.is_development() && self.jwt_secret.is_none() {
            return Err(Error::Config(
                "jwt_secret is required in production".to_string(),
            ));
        }
        if self.admin_username.trim().is_empty() || self.admin_password.is_empty() {
            return Err(Error::Config(
                "admin credentials must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Origins accepted by CORS for the active environment
    pub fn allowed_origins(&self) -> Vec<String> {
        if self.environment.is_development() {
            DEV_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
        } else {
            self.cors_origins.clone()
        }
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ========================================
// TOML file
// ========================================

/// Default config file location (`~/.config/excess-music/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("excess-music").join("config.toml"))
}

/// Default store location (`~/.local/share/excess-music/excess_music.db` on Linux)
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("excess-music"))
        .unwrap_or_else(|| PathBuf::from("./excess_music_data"))
        .join("excess_music.db")
}

/// Load a TOML config layer
///
/// A missing file is not an error (`Ok(None)`); a file that exists but
/// does not parse is.
pub fn load_toml_layer(path: &Path) -> Result<Option<ConfigLayer>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    toml::from_str::<ConfigLayer>(&content)
        .map(Some)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.admin_password, "admin123");
        assert_eq!(config.email.smtp_port, 587);
        assert!(!config.email.is_configured());
        assert!(config.database_path.is_some());
    }

    #[test]
    fn test_higher_layer_wins() {
        let cli = ConfigLayer {
            port: Some(8080),
            ..Default::default()
        };
        let file = ConfigLayer {
            port: Some(9000),
            host: Some("127.0.0.1".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(cli.or(file));
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_email_layers_merge_per_key() {
        let mut cli = ConfigLayer::default();
        cli.email.user = Some("label@example.com".to_string());
        let mut file = ConfigLayer::default();
        file.email.pass = Some("secret".to_string());
        file.email.user = Some("ignored@example.com".to_string());

        let config = Config::resolve(cli.or(file));
        assert_eq!(config.email.user.as_deref(), Some("label@example.com"));
        assert!(config.email.is_configured());
        assert_eq!(config.email.sender(), Some("label@example.com"));
        assert_eq!(config.email.recipient(), Some("label@example.com"));
    }

    #[test]
    fn test_in_memory_database_marker() {
        let layer = ConfigLayer {
            database_path: Some(IN_MEMORY_DATABASE.to_string()),
            ..Default::default()
        };
        assert!(Config::resolve(layer).database_path.is_none());
    }

    #[test]
    fn test_production_requires_secret() {
        let mut config = Config::default();
        config.environment = Environment::Production;
        assert!(config.validate().is_err());

        config.jwt_secret = Some("s3cret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_secret_treated_as_missing() {
        let layer = ConfigLayer {
            jwt_secret: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(Config::resolve(layer).jwt_secret.is_none());
    }

    #[test]
    fn test_allowed_origins_by_environment() {
        let mut config = Config::default();
        config.cors_origins = vec!["https://excessmusic.com".to_string()];
        assert_eq!(config.allowed_origins().len(), 2);

        config.environment = Environment::Production;
        assert_eq!(config.allowed_origins(), vec!["https://excessmusic.com".to_string()]);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("PRODUCTION".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }
}
