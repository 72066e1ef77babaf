//! Request authorization with cached service account tokens.
//!
//! [`AuthInterceptor::authorize`] attaches a bearer token to a request and runs it. A cached
//! token is used when present, otherwise a new one is minted. When the API answers `401`
//! the cached token is dropped, a fresh one is minted and the request is sent exactly once
//! more. Freshly minted tokens are written back only after a successful response.

use crate::{
    cache::CacheError,
    credentials::{CredentialStore, ServiceAccountKey},
    http::{ExecutorError, RequestExecutor},
    issuer::TokenIssuerAdapter,
    request::{OutgoingRequest, Response},
    token_cache::TokenCache,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Placeholder in query values replaced by the configured project id
pub const PROJECT_ID_PLACEHOLDER: &str = "{projectId}";

/// Header carrying the bearer token. Only the interceptor sets it.
pub const AUTHORIZATION: &str = "Authorization";

const UNAUTHORIZED: u16 = 401;

/// Where the token attached to the current attempt came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    Cache,
    Issuer,
}

pub struct AuthInterceptor {
    credentials: CredentialStore,
    tokens: TokenCache,
    issuer: TokenIssuerAdapter,
}

impl AuthInterceptor {
    pub fn new(credentials: CredentialStore, tokens: TokenCache, issuer: TokenIssuerAdapter) -> Self {
        Self {
            credentials,
            tokens,
            issuer,
        }
    }

    /// Authorizes `request`, hands it to `executor` and returns the final response.
    ///
    /// `request` is modified in place: it gains an `Authorization` header and
    /// `{projectId}` placeholders in query values are resolved.
    pub async fn authorize<E>(
        &self,
        executor: &E,
        request: &mut OutgoingRequest,
    ) -> Result<Response, AuthError>
    where
        E: RequestExecutor + ?Sized,
    {
        let key = self.credentials.load().await.ok_or(AuthError::NotConfigured)?;

        let (mut token, mut source) = match self.tokens.load().await {
            Some(token) => (token, TokenSource::Cache),
            None => (self.mint(&key).await?, TokenSource::Issuer),
        };
        debug!(?source, "using access token");

        request.headers.append(AUTHORIZATION, bearer(&token));
        request.query = request
            .query
            .map_values(|value| value.replace(PROJECT_ID_PLACEHOLDER, &key.project_id));

        let mut response = executor.execute(request).await?;

        if response.status == UNAUTHORIZED {
            info!("access token was rejected, requesting a new one");
            self.tokens.invalidate().await;
            token = self.mint(&key).await?;
            source = TokenSource::Issuer;

            request.headers.upsert(AUTHORIZATION, bearer(&token));
            response = executor.execute(request).await?;
        }

        if response.is_success()
            && source == TokenSource::Issuer
            && let Err(e) = self.tokens.save(&token).await
        {
            warn!(error = %e, "unable to cache access token");
        }

        Ok(response)
    }

    async fn mint(&self, key: &ServiceAccountKey) -> Result<String, AuthError> {
        self.issuer
            .fetch(key)
            .await
            .ok_or(AuthError::TokenUnavailable)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read key file: {0}")]
    KeyFileRead(#[source] std::io::Error),

    #[error("Key file is not a valid service account key: {0}")]
    MalformedKeyFile(#[source] serde_json::Error),

    #[error("The given credentials must contain project_id")]
    InvalidCredentials,

    #[error("Access token cannot be acquired. The given credentials may be wrong.")]
    CredentialsRejected,

    #[error("configure is required")]
    NotConfigured,

    #[error("Access token cannot be acquired")]
    TokenUnavailable,

    #[error("Failed to store credentials: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}
