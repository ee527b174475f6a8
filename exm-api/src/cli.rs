//! Command-line arguments
//!
//! Every flag falls back to an `EXM_*` environment variable; whatever both
//! leave unset comes from the TOML file, then from compiled defaults.

use std::path::PathBuf;

use clap::Parser;
use exm_common::config::{default_config_path, ConfigLayer, EmailLayer, Environment};

/// Command-line arguments for exm-api
#[derive(Parser, Debug, Default)]
#[command(name = "exm-api")]
#[command(about = "Excess Music catalog service")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, env = "EXM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "EXM_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "EXM_PORT")]
    pub port: Option<u16>,

    /// SQLite file, or `:memory:`
    #[arg(long, env = "EXM_DATABASE")]
    pub database: Option<String>,

    /// development or production
    #[arg(long, env = "EXM_ENV")]
    pub environment: Option<Environment>,

    /// Admin token signing secret
    #[arg(long, env = "EXM_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    #[arg(long, env = "EXM_ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    #[arg(long, env = "EXM_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Upload root directory
    #[arg(long, env = "EXM_UPLOAD_ROOT")]
    pub upload_root: Option<PathBuf>,

    /// Static frontend directory
    #[arg(long, env = "EXM_STATIC_ROOT")]
    pub static_root: Option<PathBuf>,

    /// Allowed CORS origins in production (comma separated)
    #[arg(long, env = "EXM_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Well-known mail service (`gmail`)
    #[arg(long, env = "EXM_EMAIL_SERVICE")]
    pub email_service: Option<String>,

    #[arg(long, env = "EXM_SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "EXM_SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// Implicit TLS instead of STARTTLS
    #[arg(long, env = "EXM_SMTP_SECURE")]
    pub smtp_secure: Option<bool>,

    #[arg(long, env = "EXM_EMAIL_USER")]
    pub email_user: Option<String>,

    #[arg(long, env = "EXM_EMAIL_PASS", hide_env_values = true)]
    pub email_pass: Option<String>,

    #[arg(long, env = "EXM_EMAIL_FROM")]
    pub email_from: Option<String>,

    #[arg(long, env = "EXM_EMAIL_TO")]
    pub email_to: Option<String>,
}

impl Cli {
    /// Config file to read: `--config`, else the per-user default
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(default_config_path)
    }

    /// Highest-priority configuration layer
    pub fn into_layer(self) -> ConfigLayer {
        ConfigLayer {
            host: self.host,
            port: self.port,
            database_path: self.database,
            environment: self.environment,
            jwt_secret: self.jwt_secret,
            admin_username: self.admin_username,
            admin_password: self.admin_password,
            upload_root: self.upload_root,
            static_root: self.static_root,
            cors_origins: self.cors_origins,
            email: EmailLayer {
                service: self.email_service,
                smtp_host: self.smtp_host,
                smtp_port: self.smtp_port,
                smtp_secure: self.smtp_secure,
                user: self.email_user,
                pass: self.email_pass,
                from: self.email_from,
                to: self.email_to,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exm_common::config::Config;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_flags_map_to_layer() {
        let cli = Cli::try_parse_from([
            "exm-api",
            "--port",
            "8080",
            "--environment",
            "production",
            "--cors-origins",
            "https://a.example,https://b.example",
            "--smtp-secure",
            "true",
        ])
        .unwrap();
        let layer = cli.into_layer();
        assert_eq!(layer.port, Some(8080));
        assert_eq!(layer.environment, Some(Environment::Production));
        assert_eq!(layer.cors_origins.as_ref().map(Vec::len), Some(2));
        assert_eq!(layer.email.smtp_secure, Some(true));
        assert!(layer.host.is_none());
    }

    #[test]
    #[serial]
    fn test_env_fallback_and_flag_priority() {
        std::env::set_var("EXM_PORT", "4000");
        std::env::set_var("EXM_ADMIN_USERNAME", "label");

        let from_env = Cli::try_parse_from(["exm-api"]).unwrap();
        assert_eq!(from_env.port, Some(4000));
        assert_eq!(from_env.admin_username.as_deref(), Some("label"));

        let from_flag = Cli::try_parse_from(["exm-api", "--port", "5000"]).unwrap();
        assert_eq!(from_flag.port, Some(5000));

        std::env::remove_var("EXM_PORT");
        std::env::remove_var("EXM_ADMIN_USERNAME");
    }

    #[test]
    #[serial]
    fn test_cli_layer_over_file_layer() {
        let cli = Cli::try_parse_from(["exm-api", "--admin-password", "s3cret"]).unwrap();
        let file = ConfigLayer {
            admin_password: Some("from-file".to_string()),
            admin_username: Some("boss".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(cli.into_layer().or(file));
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.admin_username, "boss");
    }

    #[test]
    #[serial]
    fn test_unknown_environment_rejected() {
        assert!(Cli::try_parse_from(["exm-api", "--environment", "staging"]).is_err());
    }
}
