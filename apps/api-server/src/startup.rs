//! Startup sequence: resolve credentials, open the pool, build state.

use sea_orm::DbErr;
use thiserror::Error;

use quill_core::error::CredentialError;
use quill_core::ports::CredentialProvider;
use quill_infra::credentials::EnvCredentialProvider;

use crate::config::{AppConfig, ConfigError, CredentialSource};
use crate::state::AppState;

/// Anything that keeps the server from coming up. The process exits non-zero
/// so a supervisor can restart it.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("credential resolution failed: {0}")]
    Credentials(#[from] CredentialError),

    #[error("database initialization failed: {0}")]
    Database(#[from] DbErr),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(not(feature = "key-vault"))]
    #[error("CREDENTIAL_SOURCE=vault but this build lacks the key-vault feature")]
    VaultUnsupported,
}

/// Pick the credential provider named by the configuration.
pub fn credential_provider(
    source: &CredentialSource,
) -> Result<Box<dyn CredentialProvider>, StartupError> {
    match source {
        CredentialSource::Env => Ok(Box::new(EnvCredentialProvider::new())),
        #[cfg(feature = "key-vault")]
        CredentialSource::KeyVault {
            vault_name,
            secret_name,
        } => {
            use quill_infra::credentials::{AzureIdentity, KeyVaultConfig, KeyVaultCredentialProvider};

            let config = KeyVaultConfig::new(
                vault_name,
                secret_name.clone(),
                AzureIdentity::default_chain(),
            );
            Ok(Box::new(KeyVaultCredentialProvider::new(config)?))
        }
        #[cfg(not(feature = "key-vault"))]
        CredentialSource::KeyVault { .. } => Err(StartupError::VaultUnsupported),
    }
}

/// Resolve credentials and connect, producing the state every worker shares.
pub async fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let provider = credential_provider(&config.credential_source)?;
    tracing::info!(provider = provider.name(), "Resolving database credentials");

    let credentials = provider.resolve().await?;
    tracing::info!(
        host = %credentials.host,
        port = credentials.port,
        database = %credentials.database,
        "Database credentials resolved"
    );

    let db_config = config.pool.database_config(credentials.connection_url()?);
    let state = AppState::init(&db_config, config.request_timeout).await?;

    Ok(state)
}
