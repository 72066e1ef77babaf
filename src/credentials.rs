//! Persistent storage for the service account key.

use crate::cache::{APP_NAMESPACE, BlobCache, CacheError};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::debug;

/// Cache entry holding the serialized key
const CREDENTIALS_ENTRY: &str = "credentials";

/// The subset of a Google service account key file this client needs.
///
/// Key files carry more fields (`private_key_id`, `token_uri`, ...); they are ignored.
/// A missing `project_id` deserializes as empty so configuration can reject it with a
/// dedicated error instead of a parse failure.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceAccountKey {
    #[serde(rename = "project_id", default)]
    pub project_id: String,

    #[serde(rename = "client_email")]
    pub client_email: String,

    #[serde(rename = "private_key")]
    pub private_key: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Holds at most one [`ServiceAccountKey`].
#[derive(Clone)]
pub struct CredentialStore {
    cache: Arc<dyn BlobCache>,
}

impl CredentialStore {
    pub fn new(cache: Arc<dyn BlobCache>) -> Self {
        Self { cache }
    }

    pub fn location(&self) -> String {
        self.cache.location(APP_NAMESPACE, CREDENTIALS_ENTRY)
    }

    pub async fn save(&self, key: &ServiceAccountKey) -> Result<(), CacheError> {
        let json = serde_json::to_vec(key)?;
        self.cache.put(APP_NAMESPACE, CREDENTIALS_ENTRY, &json).await
    }

    /// Returns the stored key, or `None` when nothing usable is stored.
    ///
    /// Read failures and corrupted content are treated as "not configured" so the user
    /// can always recover by running `configure` again.
    pub async fn load(&self) -> Option<ServiceAccountKey> {
        match self.cache.get(APP_NAMESPACE, CREDENTIALS_ENTRY).await {
            Ok(Some(bytes)) => decode_key(&bytes),
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "unable to read stored credentials");
                None
            }
        }
    }
}

/// A stored key without `project_id` cannot resolve placeholders, so it counts as malformed.
fn decode_key(bytes: &[u8]) -> Option<ServiceAccountKey> {
    let key: ServiceAccountKey = serde_json::from_slice(bytes)
        .inspect_err(|e| debug!(error = %e, "stored credentials are malformed"))
        .ok()?;
    if key.project_id.is_empty() {
        debug!("stored credentials have no project_id");
        return None;
    }
    Some(key)
}
