use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::models::{MovieId, TimeWindow};

/// Number of stored responses above which expired ones are swept on insert
const SWEEP_THRESHOLD: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Trending(TimeWindow),
    Search(String),
    Details(MovieId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Trending(window) => write!(f, "trending:{}", window),
            CacheKey::Search(query) => write!(f, "search:{}", query.trim().to_lowercase()),
            CacheKey::Details(id) => write!(f, "movie:{}", id),
        }
    }
}

struct CachedResponse {
    value: Value,
    expires_at: Instant,
}

/// Short-lived store of upstream responses
///
/// This only revalidates: values expire after their TTL and nothing is
/// indexed or persisted. Keys are compared by their `Display` form so
/// searches differing only in case share an entry.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, CachedResponse>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a fresh value, or `None` on miss, expiry, or shape mismatch
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let cached = entries.get(&key)?;
        if cached.expires_at <= Instant::now() {
            entries.remove(&key);
            tracing::debug!(key = %key, "Cache entry expired");
            return None;
        }

        match serde_json::from_value(cached.value.clone()) {
            Ok(value) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value has unexpected shape");
                entries.remove(&key);
                None
            }
        }
    }

    /// Stores a value for `ttl`; serialization failures are logged and skipped
    pub fn insert<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= SWEEP_THRESHOLD {
            entries.retain(|_, cached| cached.expires_at > now);
        }
        entries.insert(
            key.to_string(),
            CachedResponse {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cached;
    use crate::error::{AppError, AppResult};

    #[test]
    fn test_cache_key_display_trending() {
        assert_eq!(CacheKey::Trending(TimeWindow::Week).to_string(), "trending:week");
    }

    #[test]
    fn test_cache_key_display_search_lowercase() {
        let key = CacheKey::Search(" THE MATRIX ".to_string());
        assert_eq!(format!("{}", key), "search:the matrix");
    }

    #[test]
    fn test_cache_key_display_details() {
        assert_eq!(CacheKey::Details(550).to_string(), "movie:550");
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = ResponseCache::new();
        let retrieved: Option<Vec<String>> = cache.get(&CacheKey::Details(1));
        assert_eq!(retrieved, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new();
        let key = CacheKey::Search("inception".to_string());
        cache.insert(&key, &vec![1u64, 2, 3], Duration::from_secs(60));

        let hit: Option<Vec<u64>> = cache.get(&key);
        assert_eq!(hit, Some(vec![1, 2, 3]));

        tokio::time::advance(Duration::from_secs(61)).await;
        let miss: Option<Vec<u64>> = cache.get(&key);
        assert_eq!(miss, None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_search_keys_share_entry_across_case() {
        let cache = ResponseCache::new();
        cache.insert(
            &CacheKey::Search("Inception".to_string()),
            &"hit".to_string(),
            Duration::from_secs(60),
        );
        let hit: Option<String> = cache.get(&CacheKey::Search("inception".to_string()));
        assert_eq!(hit.as_deref(), Some("hit"));
    }

    #[tokio::test]
    async fn test_cached_macro_only_runs_block_on_miss() {
        let cache = ResponseCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let result: AppResult<u32> = cached!(
                cache,
                CacheKey::Details(42),
                Duration::from_secs(60),
                async {
                    calls += 1;
                    Ok::<u32, AppError>(7)
                }
            );
            assert_eq!(result.unwrap(), 7);
        }

        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_cached_macro_does_not_store_errors() {
        let cache = ResponseCache::new();
        let result: AppResult<u32> = cached!(
            cache,
            CacheKey::Details(9),
            Duration::from_secs(60),
            async { Err::<u32, AppError>(AppError::ExternalApi("down".to_string())) }
        );
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
