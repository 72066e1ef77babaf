//! Credential management and request authorization for the Android Management API.
//!
//! `configure` validates a service account key against the token endpoint and stores it
//! with a first access token. Every later request goes through [`AuthInterceptor`], which
//! reuses the cached token and refreshes it once when the API answers `401`.

pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod configure;
pub mod credentials;
pub mod http;
pub mod issuer;
pub mod logging;
pub mod request;
pub mod token_cache;

#[cfg(test)]
mod testing;

pub use auth::{AuthError, AuthInterceptor};
pub use cache::{BlobCache, FileBlobCache, MemoryBlobCache};
pub use config::Config;
pub use configure::{ConfigureReport, Configurator};
pub use credentials::{CredentialStore, ServiceAccountKey};
pub use http::{HttpExecutor, RequestExecutor};
pub use issuer::{ServiceAccountIssuer, TokenIssuer, TokenIssuerAdapter};
pub use request::{HeaderList, OutgoingRequest, QueryParams, Response};
pub use token_cache::TokenCache;
