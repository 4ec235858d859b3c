use reelfetch_extract::models::CanonicalResult;
use std::time::Duration;
use tokio::time::Instant;

use crate::key::ResultId;

/// One stored result. Owned exclusively by the cache; callers only ever see
/// clones of the payload.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub payload: CanonicalResult,
    pub id: Option<ResultId>,
    pub created_at: Instant,
    pub ttl: Duration,
}
impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelfetch_extract::models::Failure;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_strictly_after_ttl() {
        let entry = CacheEntry {
            payload: CanonicalResult::failed(Failure::NotFound),
            id: None,
            created_at: Instant::now(),
            ttl: Duration::from_secs(10),
        };
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!entry.is_expired(Instant::now()));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(entry.is_expired(Instant::now()));
    }
}
