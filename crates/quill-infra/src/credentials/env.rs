//! Credentials read straight from process environment variables.

use std::collections::HashMap;

use async_trait::async_trait;

use quill_core::domain::DatabaseCredentials;
use quill_core::error::CredentialError;
use quill_core::ports::CredentialProvider;

use super::{
    DATABASE_HOST, DATABASE_NAME, DATABASE_PASS, DATABASE_PORT, DATABASE_SSL_MODE, DATABASE_USER,
};

/// Reads the `DATABASE_*` variables.
///
/// `from_vars` swaps the process environment for a fixed map, which keeps
/// tests independent of each other.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider {
    vars: Option<HashMap<String, String>>,
}

impl EnvCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }

    fn require(&self, key: &str) -> Result<String, CredentialError> {
        self.lookup(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| CredentialError::Missing(key.to_string()))
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn resolve(&self) -> Result<DatabaseCredentials, CredentialError> {
        let port = DatabaseCredentials::parse_port(&self.require(DATABASE_PORT)?)?;

        Ok(DatabaseCredentials {
            host: self.require(DATABASE_HOST)?,
            port,
            user: self.require(DATABASE_USER)?,
            // An empty password is legal, an absent one is not.
            password: self
                .lookup(DATABASE_PASS)
                .ok_or_else(|| CredentialError::Missing(DATABASE_PASS.to_string()))?,
            database: self.require(DATABASE_NAME)?,
            ssl_mode: self
                .lookup(DATABASE_SSL_MODE)
                .filter(|mode| !mode.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (DATABASE_HOST, "localhost"),
            (DATABASE_PORT, "5432"),
            (DATABASE_USER, "quill"),
            (DATABASE_PASS, "secret"),
            (DATABASE_NAME, "posts"),
        ]
    }

    #[tokio::test]
    async fn test_resolves_all_fields() {
        let provider = EnvCredentialProvider::from_vars(full_env());
        let creds = provider.resolve().await.unwrap();

        assert_eq!(creds.host, "localhost");
        assert_eq!(creds.port, 5432);
        assert_eq!(creds.user, "quill");
        assert_eq!(creds.password, "secret");
        assert_eq!(creds.database, "posts");
        assert_eq!(creds.ssl_mode, None);
    }

    #[tokio::test]
    async fn test_missing_variable_is_reported_by_name() {
        let vars = full_env()
            .into_iter()
            .filter(|(k, _)| *k != DATABASE_NAME);
        let provider = EnvCredentialProvider::from_vars(vars);

        match provider.resolve().await {
            Err(CredentialError::Missing(name)) => assert_eq!(name, DATABASE_NAME),
            other => panic!("expected missing DATABASE_NAME, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_port_is_malformed() {
        let mut vars = full_env();
        vars[1] = (DATABASE_PORT, "fivefour");
        let provider = EnvCredentialProvider::from_vars(vars);

        assert!(matches!(
            provider.resolve().await,
            Err(CredentialError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_password_is_allowed() {
        let mut vars = full_env();
        vars[3] = (DATABASE_PASS, "");
        let provider = EnvCredentialProvider::from_vars(vars);

        assert_eq!(provider.resolve().await.unwrap().password, "");
    }
}
