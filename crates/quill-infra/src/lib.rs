//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! the SeaORM-backed post repository and the database credential providers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - Environment credentials only
//! - `key-vault` - Azure Key Vault credential provider via reqwest

pub mod credentials;
pub mod database;

// Re-exports
pub use credentials::EnvCredentialProvider;
pub use database::{DatabaseConfig, SeaOrmPostRepository};

#[cfg(feature = "key-vault")]
pub use credentials::{AzureIdentity, KeyVaultConfig, KeyVaultCredentialProvider};
