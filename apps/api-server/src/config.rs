//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use quill_infra::database::DatabaseConfig;

/// Where the database credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// The five `DATABASE_*` variables.
    Env,
    /// A JSON secret in Azure Key Vault.
    KeyVault {
        vault_name: String,
        secret_name: String,
    },
}

/// Connection pool sizing. The URL is filled in once credentials resolve.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl PoolConfig {
    pub fn database_config(&self, url: String) -> DatabaseConfig {
        DatabaseConfig {
            url,
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub credential_source: CredentialSource,
    pub pool: PoolConfig,
    /// Upper bound on each request's database work.
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be set when CREDENTIAL_SOURCE=vault")]
    MissingVaultSetting(&'static str),
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential_source = match lookup("CREDENTIAL_SOURCE").as_deref() {
            None | Some("") | Some("env") => CredentialSource::Env,
            Some("vault") | Some("key-vault") => CredentialSource::KeyVault {
                vault_name: lookup("KEY_VAULT_NAME")
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::MissingVaultSetting("KEY_VAULT_NAME"))?,
                secret_name: lookup("SECRET_NAME")
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::MissingVaultSetting("SECRET_NAME"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CREDENTIAL_SOURCE",
                    value: other.to_string(),
                });
            }
        };

        let pool = PoolConfig {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 1)?,
            connect_timeout: Duration::from_secs(parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 10)?),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            credential_source,
            pool,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
