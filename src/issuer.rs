//! Access token issuance for service accounts.
//!
//! [`ServiceAccountIssuer`] implements the OAuth 2.0 JWT bearer grant: a claim set signed
//! with the service account's private key is exchanged for a short lived access token at
//! Google's token endpoint. [`TokenIssuerAdapter`] fixes the scope and folds every failure
//! into "no token".

use crate::credentials::ServiceAccountKey;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, redirect::Policy};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

/// Google OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The only scope this client ever asks for
pub const ANDROID_MANAGEMENT_SCOPE: &str = "https://www.googleapis.com/auth/androidmanagement";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mints bearer tokens for a service account.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(
        &self,
        client_email: &str,
        private_key: &str,
        scope: &str,
    ) -> Result<String, IssuerError>;
}

pub struct ServiceAccountIssuer {
    http: Client,
    token_uri: String,
}

impl ServiceAccountIssuer {
    pub fn new(token_uri: impl Into<String>) -> Result<Self, IssuerError> {
        let http = Client::builder()
            .redirect(Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            token_uri: token_uri.into(),
        })
    }

    fn sign_assertion(
        &self,
        client_email: &str,
        private_key: &str,
        scope: &str,
    ) -> Result<String, IssuerError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: client_email,
            scope,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let key =
            EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(IssuerError::InvalidKey)?;
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(IssuerError::Signing)
    }
}

#[async_trait]
impl TokenIssuer for ServiceAccountIssuer {
    async fn issue(
        &self,
        client_email: &str,
        private_key: &str,
        scope: &str,
    ) -> Result<String, IssuerError> {
        let assertion = self.sign_assertion(client_email, private_key, scope)?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(IssuerError::Rejected {
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }

        let token = response.json::<TokenResponse>().await?.access_token;
        if token.is_empty() {
            return Err(IssuerError::EmptyToken);
        }
        Ok(token)
    }
}

/// Binds a [`TokenIssuer`] to the Android Management scope.
#[derive(Clone)]
pub struct TokenIssuerAdapter {
    issuer: Arc<dyn TokenIssuer>,
}

impl TokenIssuerAdapter {
    pub fn new(issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { issuer }
    }

    /// Requests a fresh token, or `None` if the issuer could not produce one.
    ///
    /// Transport failures and rejected credentials are not distinguished.
    pub async fn fetch(&self, key: &ServiceAccountKey) -> Option<String> {
        debug!(client_email = %key.client_email, "requesting access token");
        match self
            .issuer
            .issue(&key.client_email, &key.private_key, ANDROID_MANAGEMENT_SCOPE)
            .await
        {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) => {
                warn!("token issuer returned an empty access token");
                None
            }
            Err(e) => {
                warn!(error = %e, "access token cannot be acquired");
                None
            }
        }
    }
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum IssuerError {
    #[error("Invalid RSA private key (PEM): {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to sign JWT assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Token endpoint rejected the assertion: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("Token endpoint returned an empty access token")]
    EmptyToken,

    #[error("HTTP request failed: {0}")]
    ReqwestRequest(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "access_token")]
    access_token: String,
}
