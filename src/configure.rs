//! One-shot setup: validate a service account key and store it.

use crate::{
    auth::AuthError,
    credentials::{CredentialStore, ServiceAccountKey},
    issuer::TokenIssuerAdapter,
    token_cache::TokenCache,
};
use futures_util::future::try_join;
use std::path::Path;
use tracing::info;

/// Where configuration put things
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub credentials_location: String,
    pub access_token_location: String,
}

pub struct Configurator<'a> {
    pub credentials: &'a CredentialStore,
    pub tokens: &'a TokenCache,
    pub issuer: &'a TokenIssuerAdapter,
}

impl Configurator<'_> {
    /// Reads a key file from disk and runs [`Self::save_credentials`] on its content.
    pub async fn configure_from_file(&self, path: &Path) -> Result<ConfigureReport, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(AuthError::KeyFileRead)?;
        self.save_credentials(&content).await
    }

    /// Validates `key_file_content` and persists it together with a fresh access token.
    ///
    /// The key is only stored after the token issuer accepted it, so unusable credentials
    /// never end up in the cache.
    pub async fn save_credentials(
        &self,
        key_file_content: &str,
    ) -> Result<ConfigureReport, AuthError> {
        let key = ServiceAccountKey::from_json(key_file_content)
            .map_err(AuthError::MalformedKeyFile)?;

        if key.project_id.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .issuer
            .fetch(&key)
            .await
            .ok_or(AuthError::CredentialsRejected)?;

        let credentials_location = self.credentials.location();
        let access_token_location = self.tokens.location();

        try_join(
            async {
                self.credentials.save(&key).await?;
                info!(location = %credentials_location, "credentials stored");
                Ok::<_, AuthError>(())
            },
            async {
                self.tokens.save(&token).await?;
                info!(location = %access_token_location, "access token stored");
                Ok::<_, AuthError>(())
            },
        )
        .await?;

        Ok(ConfigureReport {
            credentials_location,
            access_token_location,
        })
    }
}
