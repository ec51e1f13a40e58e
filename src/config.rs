//! Service settings, read from `config/default.toml` (optional) and then
//! from `SPLITLEDGER__*` environment variables, e.g.
//! `SPLITLEDGER__AUTH__JWT_SECRET`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub share: ShareSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Without a URI everything is kept in memory.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_database_name")]
    pub name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            uri: None,
            name: default_database_name(),
        }
    }
}

fn default_database_name() -> String {
    "OpenSplit".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareSettings {
    #[serde(default = "default_client_url")]
    pub client_url: String,
    #[serde(default = "default_ttl_days")]
    pub ttl_days: i64,
}

impl Default for ShareSettings {
    fn default() -> Self {
        ShareSettings {
            client_url: default_client_url(),
            ttl_days: default_ttl_days(),
        }
    }
}

fn default_client_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_ttl_days() -> i64 {
    7
}

const MAX_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            base_currency: default_base_currency(),
        }
    }
}

fn default_base_currency() -> String {
    "GBP".to_string()
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("SPLITLEDGER").separator("__"));
        // Deployments that predate the prefixed variables only set this one
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            builder = builder.set_default("database.uri", uri)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;

        settings.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".into()));
        }
        if !(1..=MAX_TTL_DAYS).contains(&self.share.ttl_days) {
            return Err(ConfigError::Message(format!(
                "share.ttl_days must be between 1 and {MAX_TTL_DAYS}"
            )));
        }
        self.ledger.base_currency = crate::currency::parse_code(&self.ledger.base_currency)
            .map_err(|err| ConfigError::Message(err.to_string()))?;
        Ok(self)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Settings {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings {
                jwt_secret: "test-secret".into(),
            },
            share: ShareSettings::default(),
            ledger: LedgerSettings::default(),
        }
    }
}
