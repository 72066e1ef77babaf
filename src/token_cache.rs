//! Persistent storage for a single bearer token.

use crate::cache::{APP_NAMESPACE, BlobCache, CacheError};
use std::sync::Arc;
use tracing::debug;

/// Cache entry holding the raw token string
const ACCESS_TOKEN_ENTRY: &str = "access_token";

/// Holds at most one bearer token.
///
/// A cached token is assumed valid until the API answers `401`.
#[derive(Clone)]
pub struct TokenCache {
    cache: Arc<dyn BlobCache>,
}

impl TokenCache {
    pub fn new(cache: Arc<dyn BlobCache>) -> Self {
        Self { cache }
    }

    pub fn location(&self) -> String {
        self.cache.location(APP_NAMESPACE, ACCESS_TOKEN_ENTRY)
    }

    pub async fn save(&self, token: &str) -> Result<(), CacheError> {
        if token.is_empty() {
            return Err(CacheError::EmptyValue(self.location()));
        }
        self.cache
            .put(APP_NAMESPACE, ACCESS_TOKEN_ENTRY, token.as_bytes())
            .await
    }

    /// Returns the cached token. Missing, unreadable and empty entries are all `None`.
    pub async fn load(&self) -> Option<String> {
        let bytes = match self.cache.get(APP_NAMESPACE, ACCESS_TOKEN_ENTRY).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "unable to read cached access token");
                return None;
            }
        };
        String::from_utf8(bytes)
            .inspect_err(|e| debug!(error = %e, "cached access token is not UTF-8"))
            .ok()
            .filter(|token| !token.is_empty())
    }

    /// Drops the cached token. Best effort: failures are logged and ignored.
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.delete(APP_NAMESPACE, ACCESS_TOKEN_ENTRY).await {
            debug!(error = %e, "access token invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBlobCache;

    fn token_cache() -> (Arc<MemoryBlobCache>, TokenCache) {
        let cache = Arc::new(MemoryBlobCache::new());
        (cache.clone(), TokenCache::new(cache))
    }

    #[tokio::test]
    async fn saved_token_can_be_loaded() {
        let (_, tokens) = token_cache();

        tokens.save("tok-A").await.unwrap();

        assert_eq!(tokens.load().await.as_deref(), Some("tok-A"));
    }

    #[tokio::test]
    async fn empty_token_is_never_stored() {
        let (cache, tokens) = token_cache();

        assert!(matches!(
            tokens.save("").await,
            Err(CacheError::EmptyValue(_))
        ));
        assert_eq!(
            cache.get(APP_NAMESPACE, ACCESS_TOKEN_ENTRY).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn empty_or_binary_entries_load_as_none() {
        let (cache, tokens) = token_cache();

        cache.put(APP_NAMESPACE, ACCESS_TOKEN_ENTRY, b"").await.unwrap();
        assert_eq!(tokens.load().await, None);

        cache
            .put(APP_NAMESPACE, ACCESS_TOKEN_ENTRY, &[0xff, 0xfe])
            .await
            .unwrap();
        assert_eq!(tokens.load().await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_token_and_tolerates_missing_entry() {
        let (_, tokens) = token_cache();

        tokens.save("tok-A").await.unwrap();
        tokens.invalidate().await;
        assert_eq!(tokens.load().await, None);

        // Nothing stored anymore; must not panic or error
        tokens.invalidate().await;
    }
}
