//! Credentials fetched from an Azure Key Vault secret.
//!
//! The secret value is a JSON object carrying the same `DATABASE_*` keys the
//! environment provider reads. Access tokens come from an ordered chain of
//! Azure identities; the first one that yields a token wins.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use quill_core::domain::DatabaseCredentials;
use quill_core::error::CredentialError;
use quill_core::ports::CredentialProvider;

use super::CredentialFields;

const VAULT_RESOURCE: &str = "https://vault.azure.net";
const VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const VAULT_API_VERSION: &str = "7.4";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// One way to obtain a Microsoft Entra ID access token.
#[derive(Debug, Clone)]
pub enum AzureIdentity {
    /// Service principal with a client secret.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Kubernetes workload identity: a federated token file exchanged for an
    /// access token.
    WorkloadIdentity {
        tenant_id: String,
        client_id: String,
        token_file: PathBuf,
    },
    /// Managed identity exposed by App Service and Container Apps.
    AppServiceManagedIdentity {
        endpoint: String,
        header: String,
        client_id: Option<String>,
    },
    /// Managed identity from the instance metadata service. `client_id`
    /// selects a user-assigned identity.
    ManagedIdentity { client_id: Option<String> },
    /// The signed-in Azure CLI user, for local development.
    AzureCli,
}

impl AzureIdentity {
    /// The default Azure credential chain built from the process environment.
    pub fn default_chain() -> Vec<Self> {
        Self::chain_from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the chain in default-credential order: environment service
    /// principal, workload identity, managed identity, Azure CLI. Sources whose
    /// variables are absent are skipped; managed identity and the CLI are always
    /// tried.
    pub fn chain_from_lookup<F>(lookup: F) -> Vec<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let tenant_id = var("AZURE_TENANT_ID");
        let client_id = var("AZURE_CLIENT_ID");

        let mut chain = Vec::new();

        if let (Some(tenant_id), Some(client_id), Some(client_secret)) =
            (&tenant_id, &client_id, var("AZURE_CLIENT_SECRET"))
        {
            chain.push(Self::ClientSecret {
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                client_secret,
            });
        }

        if let (Some(tenant_id), Some(client_id), Some(token_file)) =
            (&tenant_id, &client_id, var("AZURE_FEDERATED_TOKEN_FILE"))
        {
            chain.push(Self::WorkloadIdentity {
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                token_file: PathBuf::from(token_file),
            });
        }

        match (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => chain.push(Self::AppServiceManagedIdentity {
                endpoint,
                header,
                client_id: client_id.clone(),
            }),
            _ => chain.push(Self::ManagedIdentity { client_id }),
        }

        chain.push(Self::AzureCli);
        chain
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientSecret { .. } => "client-secret",
            Self::WorkloadIdentity { .. } => "workload-identity",
            Self::AppServiceManagedIdentity { .. } => "app-service-managed-identity",
            Self::ManagedIdentity { .. } => "managed-identity",
            Self::AzureCli => "azure-cli",
        }
    }
}

/// Where the secret lives and how to reach it.
#[derive(Clone)]
pub struct KeyVaultConfig {
    /// Base URL, e.g. `https://my-vault.vault.azure.net`.
    pub vault_url: String,
    pub secret_name: String,
    /// Tried in order until one produces a token.
    pub identities: Vec<AzureIdentity>,
    pub authority_host: String,
    pub imds_endpoint: String,
    /// Overall timeout for each HTTP call.
    pub timeout: Duration,
    /// Off Azure the metadata endpoint never answers, so this stays short.
    pub imds_timeout: Duration,
}

impl KeyVaultConfig {
    pub fn new(
        vault_name: &str,
        secret_name: impl Into<String>,
        identities: Vec<AzureIdentity>,
    ) -> Self {
        Self {
            vault_url: format!("https://{vault_name}.vault.azure.net"),
            secret_name: secret_name.into(),
            identities,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            imds_endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            imds_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

/// Resolves credentials with two sequential calls: token, then secret.
pub struct KeyVaultCredentialProvider {
    config: KeyVaultConfig,
    client: reqwest::Client,
}

impl KeyVaultCredentialProvider {
    pub fn new(config: KeyVaultConfig) -> Result<Self, CredentialError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CredentialError::Vault(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Walk the identity chain, returning the first token obtained.
    async fn access_token(&self) -> Result<String, CredentialError> {
        let mut failures = Vec::new();

        for identity in &self.config.identities {
            match self.token_from(identity).await {
                Ok(token) => {
                    tracing::info!(identity = identity.kind(), "Acquired vault access token");
                    return Ok(token);
                }
                Err(e) => {
                    tracing::debug!(identity = identity.kind(), error = %e, "Identity unavailable");
                    failures.push(format!("{}: {e}", identity.kind()));
                }
            }
        }

        if failures.is_empty() {
            return Err(CredentialError::Identity("no identity configured".to_string()));
        }
        Err(CredentialError::Identity(failures.join("; ")))
    }

    async fn token_from(&self, identity: &AzureIdentity) -> Result<String, CredentialError> {
        let request = match identity {
            AzureIdentity::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => self.client.post(self.token_url(tenant_id)).form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", VAULT_SCOPE),
            ]),
            AzureIdentity::WorkloadIdentity {
                tenant_id,
                client_id,
                token_file,
            } => {
                let assertion = tokio::fs::read_to_string(token_file).await.map_err(|e| {
                    CredentialError::Identity(format!("{}: {e}", token_file.display()))
                })?;
                self.client.post(self.token_url(tenant_id)).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_assertion_type", CLIENT_ASSERTION_TYPE),
                    ("client_assertion", assertion.trim()),
                    ("scope", VAULT_SCOPE),
                ])
            }
            AzureIdentity::AppServiceManagedIdentity {
                endpoint,
                header,
                client_id,
            } => {
                let mut query = vec![
                    ("api-version", APP_SERVICE_API_VERSION),
                    ("resource", VAULT_RESOURCE),
                ];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                self.client
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", header)
                    .query(&query)
            }
            AzureIdentity::ManagedIdentity { client_id } => {
                let mut query = vec![
                    ("api-version", IMDS_API_VERSION),
                    ("resource", VAULT_RESOURCE),
                ];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                self.client
                    .get(&self.config.imds_endpoint)
                    .header("Metadata", "true")
                    .query(&query)
                    .timeout(self.config.imds_timeout)
            }
            AzureIdentity::AzureCli => return cli_token().await,
        };

        let response = request
            .send()
            .await
            .map_err(|e| CredentialError::Identity(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Identity(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Identity(e.to_string()))?;

        Ok(token.access_token)
    }

    fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_host.trim_end_matches('/'),
            tenant_id
        )
    }

    async fn fetch_secret(&self, token: &str) -> Result<String, CredentialError> {
        // No version segment: the vault returns the latest version.
        let url = format!(
            "{}/secrets/{}",
            self.config.vault_url.trim_end_matches('/'),
            self.config.secret_name
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("api-version", VAULT_API_VERSION)])
            .send()
            .await
            .map_err(|e| CredentialError::Vault(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::Vault(format!(
                "secret '{}' returned {status}",
                self.config.secret_name
            )));
        }

        let bundle: SecretBundle = response
            .json()
            .await
            .map_err(|e| CredentialError::Vault(e.to_string()))?;

        Ok(bundle.value)
    }
}

/// Ask the Azure CLI for a token as the signed-in user.
async fn cli_token() -> Result<String, CredentialError> {
    let output = Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            VAULT_RESOURCE,
            "--output",
            "json",
        ])
        .output()
        .await
        .map_err(|e| CredentialError::Identity(format!("az not runnable: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CredentialError::Identity(stderr.trim().to_string()));
    }

    let token: CliTokenResponse = serde_json::from_slice(&output.stdout)
        .map_err(|e| CredentialError::Identity(e.to_string()))?;

    Ok(token.access_token)
}

#[async_trait]
impl CredentialProvider for KeyVaultCredentialProvider {
    fn name(&self) -> &'static str {
        "key-vault"
    }

    async fn resolve(&self) -> Result<DatabaseCredentials, CredentialError> {
        tracing::info!(
            vault = %self.config.vault_url,
            secret = %self.config.secret_name,
            identities = self.config.identities.len(),
            "Fetching database credentials from Key Vault"
        );

        let token = self.access_token().await?;
        let value = self.fetch_secret(&token).await?;

        let fields: CredentialFields = serde_json::from_str(&value).map_err(|e| {
            CredentialError::Malformed(format!("secret payload is not valid credentials JSON: {e}"))
        })?;

        fields.into_credentials()
    }
}
