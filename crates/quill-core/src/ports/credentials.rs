use async_trait::async_trait;

use crate::domain::DatabaseCredentials;
use crate::error::CredentialError;

/// Source of database credentials, consulted once at startup.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Short label for logs (`env`, `key-vault`).
    fn name(&self) -> &'static str;

    async fn resolve(&self) -> Result<DatabaseCredentials, CredentialError>;
}
