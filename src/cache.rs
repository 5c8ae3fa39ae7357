use crate::signals::ScoreResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Default freshness window for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedScore {
    pub hostname: String,
    pub result: ScoreResult,
    pub cached_at: SystemTime,
}

/// Hostname-keyed cache of scoring results.
///
/// Entries older than the freshness window are treated as absent; they
/// are dropped lazily on lookup or via `prune`. Cheap to clone and share
/// across tasks.
#[derive(Debug, Clone)]
pub struct ScoreCache {
    entries: Arc<RwLock<HashMap<String, CachedScore>>>,
    ttl: Duration,
}

impl Default for ScoreCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ScoreCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn is_fresh(&self, entry: &CachedScore) -> bool {
        SystemTime::now()
            .duration_since(entry.cached_at)
            .map(|age| age < self.ttl)
            .unwrap_or(false)
    }

    /// Look up a fresh result for a hostname. A stale entry is removed
    /// and reported as a miss.
    pub async fn get(&self, hostname: &str) -> Option<ScoreResult> {
        let hostname = hostname.to_lowercase();
        {
            let entries = self.entries.read().await;
            match entries.get(&hostname) {
                Some(entry) if self.is_fresh(entry) => {
                    log::debug!("Using cached score for {hostname}");
                    return Some(entry.result.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is stale; drop it.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&hostname) {
            if !self.is_fresh(entry) {
                log::debug!("Evicting stale score for {hostname}");
                entries.remove(&hostname);
            }
        }
        None
    }

    pub async fn put(&self, hostname: &str, result: ScoreResult) {
        let hostname = hostname.to_lowercase();
        let mut entries = self.entries.write().await;
        entries.insert(
            hostname.clone(),
            CachedScore {
                hostname,
                result,
                cached_at: SystemTime::now(),
            },
        );
    }

    /// Remove every stale entry, returning how many were dropped.
    pub async fn prune(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| {
            SystemTime::now()
                .duration_since(entry.cached_at)
                .map(|age| age < ttl)
                .unwrap_or(false)
        });
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signal;

    fn sample_result() -> ScoreResult {
        ScoreResult {
            score: 89,
            raw_score: 89,
            breakdown: vec![Signal::new("ssl", 20, "HTTPS present")],
            confidence: 77,
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_is_returned() {
        let cache = ScoreCache::default();
        cache.put("example.com", sample_result()).await;
        let hit = cache.get("example.com").await;
        assert_eq!(hit.unwrap().score, 89);
    }

    #[tokio::test]
    async fn test_hostname_lookup_is_case_insensitive() {
        let cache = ScoreCache::default();
        cache.put("Example.COM", sample_result()).await;
        assert!(cache.get("example.com").await.is_some());
    }

    #[tokio::test]
    async fn test_stale_entry_treated_as_absent() {
        let cache = ScoreCache::new(Duration::ZERO);
        cache.put("example.com", sample_result()).await;
        assert!(cache.get("example.com").await.is_none());
        // The stale entry was also evicted.
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_prune_drops_only_stale_entries() {
        let cache = ScoreCache::new(Duration::ZERO);
        cache.put("stale.example", sample_result()).await;
        let dropped = cache.prune().await;
        assert_eq!(dropped, 1);
        assert_eq!(cache.len().await, 0);

        let cache = ScoreCache::default();
        cache.put("fresh.example", sample_result()).await;
        assert_eq!(cache.prune().await, 0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_hostname_misses() {
        let cache = ScoreCache::default();
        assert!(cache.get("nothing.example").await.is_none());
    }
}
