//! Database credential providers - environment variables and Azure Key Vault.

mod env;

#[cfg(feature = "key-vault")]
mod key_vault;

pub use env::EnvCredentialProvider;

#[cfg(feature = "key-vault")]
pub use key_vault::{AzureIdentity, KeyVaultConfig, KeyVaultCredentialProvider};

use serde::Deserialize;

use quill_core::domain::DatabaseCredentials;
use quill_core::error::CredentialError;

pub const DATABASE_HOST: &str = "DATABASE_HOST";
pub const DATABASE_PORT: &str = "DATABASE_PORT";
pub const DATABASE_USER: &str = "DATABASE_USER";
pub const DATABASE_PASS: &str = "DATABASE_PASS";
pub const DATABASE_NAME: &str = "DATABASE_NAME";
pub const DATABASE_SSL_MODE: &str = "DATABASE_SSL_MODE";

/// The five connection fields as they appear in a JSON secret blob.
#[cfg_attr(not(feature = "key-vault"), allow(dead_code))]
#[derive(Debug, Deserialize)]
pub(crate) struct CredentialFields {
    #[serde(rename = "DATABASE_HOST")]
    host: String,
    #[serde(rename = "DATABASE_PORT")]
    port: PortField,
    #[serde(rename = "DATABASE_USER")]
    user: String,
    #[serde(rename = "DATABASE_PASS")]
    password: String,
    #[serde(rename = "DATABASE_NAME")]
    database: String,
    #[serde(rename = "DATABASE_SSL_MODE", default)]
    ssl_mode: Option<String>,
}

/// Ports show up both quoted and bare in secret payloads.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortField {
    Number(u16),
    Text(String),
}

impl CredentialFields {
    pub(crate) fn into_credentials(self) -> Result<DatabaseCredentials, CredentialError> {
        let port = match self.port {
            PortField::Number(port) => port,
            PortField::Text(raw) => DatabaseCredentials::parse_port(&raw)?,
        };

        for (name, value) in [
            (DATABASE_HOST, &self.host),
            (DATABASE_USER, &self.user),
            (DATABASE_NAME, &self.database),
        ] {
            if value.trim().is_empty() {
                return Err(CredentialError::Missing(name.to_string()));
            }
        }

        Ok(DatabaseCredentials {
            host: self.host,
            port,
            user: self.user,
            password: self.password,
            database: self.database,
            ssl_mode: self.ssl_mode.filter(|mode| !mode.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_accept_quoted_and_bare_ports() {
        let quoted: CredentialFields = serde_json::from_str(
            r#"{"DATABASE_HOST":"h","DATABASE_PORT":"1433","DATABASE_USER":"u",
                "DATABASE_PASS":"p","DATABASE_NAME":"d"}"#,
        )
        .unwrap();
        assert_eq!(quoted.into_credentials().unwrap().port, 1433);

        let bare: CredentialFields = serde_json::from_str(
            r#"{"DATABASE_HOST":"h","DATABASE_PORT":5432,"DATABASE_USER":"u",
                "DATABASE_PASS":"p","DATABASE_NAME":"d","DATABASE_SSL_MODE":"require"}"#,
        )
        .unwrap();
        let creds = bare.into_credentials().unwrap();
        assert_eq!(creds.port, 5432);
        assert_eq!(creds.ssl_mode.as_deref(), Some("require"));
    }

    #[test]
    fn test_fields_reject_blank_host() {
        let fields: CredentialFields = serde_json::from_str(
            r#"{"DATABASE_HOST":" ","DATABASE_PORT":"1","DATABASE_USER":"u",
                "DATABASE_PASS":"p","DATABASE_NAME":"d"}"#,
        )
        .unwrap();
        assert!(matches!(
            fields.into_credentials(),
            Err(CredentialError::Missing(name)) if name == DATABASE_HOST
        ));
    }
}
