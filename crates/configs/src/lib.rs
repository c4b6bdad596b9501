//! # configs
//!
//! Layered runtime settings. Sources, lowest priority first:
//! built-in defaults, `config/stackit.toml` (optional), then environment
//! variables such as `STACKIT__SERVER__PORT=8080`. A `.env` file is loaded
//! into the environment before the layers are read.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "STACKIT";
const ENV_SEPARATOR: &str = "__";
const CONFIG_FILE: &str = "config/stackit";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: &'static str },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub forum: ForumSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// Absent means the in-memory store.
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ForumSettings {
    pub page_size: u32,
    pub notification_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    pub log_format: LogFormat,
    pub filter: String,
}

impl Settings {
    /// Reads `.env`, the optional config file, and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment());
        Self::from_builder(builder)
    }

    /// Defaults for every key except `auth.jwt_secret`, which must be supplied.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_ttl_hours", 720)?
            .set_default("forum.page_size", 10)?
            .set_default("forum.notification_limit", 50)?
            .set_default("telemetry.log_format", "pretty")?
            .set_default("telemetry.filter", "info")?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.auth.jwt_secret.expose_secret().is_empty() {
            return Err(SettingsError::Invalid {
                key: "auth.jwt_secret",
                reason: "must not be empty",
            });
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(SettingsError::Invalid {
                key: "auth.token_ttl_hours",
                reason: "must be positive",
            });
        }
        if self.forum.page_size == 0 {
            return Err(SettingsError::Invalid {
                key: "forum.page_size",
                reason: "must be at least 1",
            });
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid {
                key: "database.max_connections",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// `STACKIT__SECTION__KEY` variables.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
