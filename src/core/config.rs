//! Configuration management

use clap::Parser;
use config::{Config as ConfigBuilder, ConfigError as BuilderError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Invalid email configuration: {0}")]
    InvalidEmail(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    pub connection_pool_size: u32,
    /// Busy timeout in milliseconds
    pub busy_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Symmetric secret used to sign bearer tokens
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// When false, verification mails are logged instead of sent
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// Sender address, e.g. "Phonebook <noreply@example.com>"
    pub from: String,
    /// Public base URL embedded in verification links
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory served statically; avatars land in `<public_dir>/avatars`
    pub public_dir: PathBuf,
    /// Scratch directory for in-flight uploads
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json"
    pub format: String,
    /// "stdout" or "file"
    pub output: String,
    pub log_file: Option<PathBuf>,
}

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "phonebook", about = "Contacts REST backend", version)]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with precedence: CLI args > environment variables
    /// (`PHONEBOOK_*`, `__` separator) > config file > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(CliArgs::parse())
    }

    pub fn load_with(cli_args: CliArgs) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "./data/phonebook.db")?
            .set_default("database.connection_pool_size", 10)?
            .set_default("database.busy_timeout", 5000)?
            .set_default("security.jwt_secret", "change-this-secret-in-production")?
            .set_default("security.allowed_origins", vec!["*"])?
            .set_default("email.enabled", false)?
            .set_default("email.smtp_host", "")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.username", "")?
            .set_default("email.password", "")?
            .set_default("email.from", "Phonebook <noreply@phonebook.local>")?
            .set_default("email.base_url", "http://localhost:3000")?
            .set_default("storage.public_dir", "./public")?
            .set_default("storage.temp_dir", "./tmp")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("logging.output", "stdout")?;

        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string(),
                ));
            }
            builder = builder.add_source(File::from(config_path.clone()));
        }

        builder = builder.add_source(
            Environment::with_prefix("PHONEBOOK")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("security.allowed_origins"),
        );

        if let Some(host) = cli_args.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port as i64)?;
        }
        if let Some(database) = cli_args.database {
            builder = builder.set_override("database.path", database.display().to_string())?;
        }
        if let Some(log_level) = cli_args.log_level {
            builder = builder.set_override("logging.level", log_level)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidServer("host must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServer("port must not be 0".into()));
        }
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidSecurity(
                "jwt_secret must not be empty".into(),
            ));
        }
        if self.email.enabled {
            if self.email.smtp_host.is_empty() {
                return Err(ConfigError::InvalidEmail(
                    "smtp_host is required when email is enabled".into(),
                ));
            }
            if self.email.base_url.is_empty() {
                return Err(ConfigError::InvalidEmail(
                    "base_url is required when email is enabled".into(),
                ));
            }
        }
        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown format '{}'",
                    other
                )))
            }
        }
        match self.logging.output.as_str() {
            "stdout" => {}
            "file" => {
                if self.logging.log_file.is_none() {
                    return Err(ConfigError::InvalidLogging(
                        "log_file is required when output is 'file'".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown output '{}'",
                    other
                )))
            }
        }
        Ok(())
    }
}
