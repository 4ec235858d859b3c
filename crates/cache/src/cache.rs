use reelfetch_extract::models::{CanonicalResult, Failure};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, instrument};

use crate::entry::CacheEntry;
use crate::key::{CacheKey, ResultId};

/// How long an expired id keeps answering [`Lookup::Expired`] by default.
pub const DEFAULT_TOMBSTONE_RETENTION: Duration = Duration::from_secs(30 * 60);

type Flight = Arc<OnceCell<CanonicalResult>>;

/// A flight nobody is driving or waiting on: unresolved, and only the
/// in-flight map still holds it.
fn is_abandoned(flight: &Flight) -> bool {
    !flight.initialized() && Arc::strong_count(flight) == 1
}

/// Result of looking a cached result up by its [`ResultId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(CanonicalResult),
    /// The id was valid once, but its result has aged out.
    Expired,
    NotFound,
}
impl From<Lookup> for CanonicalResult {
    fn from(lookup: Lookup) -> Self {
        match lookup {
            Lookup::Found(result) => result,
            Lookup::Expired => CanonicalResult::failed(Failure::Expired),
            Lookup::NotFound => CanonicalResult::failed(Failure::NotFound),
        }
    }
}

/// Point-in-time sizes of the cache's internal tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub aliases: usize,
    pub tombstones: usize,
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<CacheKey, CacheEntry>,
    aliases: HashMap<ResultId, CacheKey>,
    /// Ids whose entry expired, with the moment it happened.
    tombstones: HashMap<ResultId, Instant>,
    in_flight: HashMap<CacheKey, Flight>,
}
impl State {
    fn fresh(&mut self, key: &CacheKey, now: Instant) -> Option<CanonicalResult> {
        if self.entries.get(key)?.is_expired(now) {
            self.expire(key, now);
            return None;
        }
        self.entries.get(key).map(|entry| entry.payload.clone())
    }

    /// Removes the entry under `key` together with its alias.
    fn expire(&mut self, key: &CacheKey, now: Instant) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        if let Some(id) = entry.id {
            if self.aliases.get(&id) == Some(key) {
                self.aliases.remove(&id);
            }
            self.tombstones.insert(id, now);
        }
        true
    }

    fn store(&mut self, key: CacheKey, mut payload: CanonicalResult, ttl: Duration, now: Instant) -> CanonicalResult {
        self.expire(&key, now);
        let id = match payload.id.as_deref() {
            Some(id) => Some(ResultId::from(id)),
            None if payload.success => Some(ResultId::generate()),
            None => None,
        };
        if let Some(id) = &id {
            payload = payload.with_id(id.to_string());
            self.tombstones.remove(id);
            self.aliases.insert(id.clone(), key.clone());
        }
        let entry = CacheEntry {
            payload: payload.clone(),
            id,
            created_at: now,
            ttl,
        };
        self.entries.insert(key, entry);
        payload
    }

    /// Clears the in-flight marker for `key` if it is still `flight`.
    fn land(&mut self, key: &CacheKey, flight: &Flight) {
        if self.in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, flight)) {
            self.in_flight.remove(key);
        }
    }

    fn purge_tombstones(&mut self, now: Instant, retention: Duration) -> usize {
        let before = self.tombstones.len();
        self.tombstones
            .retain(|_, expired_at| now.saturating_duration_since(*expired_at) <= retention);
        before - self.tombstones.len()
    }
}

/// Clears a flight's marker when the future driving it is dropped early.
///
/// Only acts when no other caller holds the flight; otherwise the next
/// waiter runs the resolution instead. If the state is locked at that moment
/// the marker is left for [`ResultCache::evict_expired`].
struct FlightGuard<'a> {
    cache: &'a ResultCache,
    key: &'a CacheKey,
    flight: &'a Flight,
}
impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let Ok(mut state) = self.cache.inner.state.try_lock() else {
            return;
        };
        // The map and this caller.
        if Arc::strong_count(self.flight) == 2 {
            debug!(key = %self.key, "resolution cancelled");
            state.land(self.key, self.flight);
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    tombstone_retention: Duration,
}

/// Time-bounded store of resolved posts, safe to share between tasks.
///
/// Cloning is cheap and every clone sees the same entries. All bookkeeping
/// happens under one short critical section; resolutions themselves always
/// run outside of it.
#[derive(Debug, Clone)]
pub struct ResultCache {
    inner: Arc<Inner>,
}
impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TOMBSTONE_RETENTION)
    }
}
impl ResultCache {
    pub fn new(tombstone_retention: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                tombstone_retention,
            }),
        }
    }

    /// Fresh payload stored under `key`. An expired entry is removed on the
    /// way out and never served again.
    pub async fn get(&self, key: &CacheKey) -> Option<CanonicalResult> {
        let mut state = self.inner.state.lock().await;
        state.fresh(key, Instant::now())
    }

    /// Stores `value` under `key`, replacing whatever was there.
    ///
    /// A successful value without an id is given a fresh [`ResultId`]. The
    /// replaced entry's id stops resolving. Returns the payload as stored.
    pub async fn put(&self, key: CacheKey, value: CanonicalResult, ttl: Duration) -> CanonicalResult {
        let mut state = self.inner.state.lock().await;
        state.store(key, value, ttl, Instant::now())
    }

    pub async fn lookup(&self, id: &ResultId) -> Lookup {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        if let Some(key) = state.aliases.get(id).cloned() {
            return match state.fresh(&key, now) {
                Some(payload) => Lookup::Found(payload),
                None => Lookup::Expired,
            };
        }
        match state.tombstones.get(id).copied() {
            Some(expired_at) if now.saturating_duration_since(expired_at) <= self.inner.tombstone_retention => {
                Lookup::Expired
            },
            Some(_) => {
                state.tombstones.remove(id);
                Lookup::NotFound
            },
            None => Lookup::NotFound,
        }
    }

    /// Drops every expired entry (with its alias), forgets tombstones past
    /// their retention and clears abandoned in-flight markers. Returns the
    /// number of entries dropped.
    pub async fn evict_expired(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.expire(key, now);
        }
        let purged = state.purge_tombstones(now, self.inner.tombstone_retention);
        let flights = state.in_flight.len();
        state.in_flight.retain(|_, flight| !is_abandoned(flight));
        let abandoned = flights - state.in_flight.len();
        if !expired.is_empty() || purged > 0 || abandoned > 0 {
            debug!(evicted = expired.len(), purged, abandoned, "evicted expired cache entries");
        }
        expired.len()
    }

    /// Serves a fresh hit for `key`, or runs `resolve` to produce one.
    ///
    /// Concurrent callers for the same key share a single resolution: only
    /// the first runs `resolve`, everyone gets its result. Successes are
    /// stored before the in-flight marker is cleared, so a caller arriving
    /// in between sees the stored entry. Failures reach every waiter of that
    /// flight but are never stored.
    ///
    /// Dropping the returned future mid-resolution is safe: a caller still
    /// waiting on the same flight takes over, otherwise the marker is removed.
    #[instrument(level = "debug", skip(self, key, resolve), fields(key = %key))]
    pub async fn get_or_resolve<F, Fut>(&self, key: CacheKey, ttl: Duration, resolve: F) -> CanonicalResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CanonicalResult>,
    {
        let flight = {
            let mut state = self.inner.state.lock().await;
            if let Some(hit) = state.fresh(&key, Instant::now()) {
                debug!("cache hit");
                return hit;
            }
            match state.in_flight.get(&key) {
                Some(flight) => {
                    debug!("joining in-flight resolution");
                    Arc::clone(flight)
                },
                None => {
                    let flight = Flight::default();
                    state.in_flight.insert(key.clone(), Arc::clone(&flight));
                    flight
                },
            }
        };

        let guard = FlightGuard {
            cache: self,
            key: &key,
            flight: &flight,
        };
        let store_key = key.clone();
        let result = flight
            .get_or_init(|| async move {
                let result = resolve().await;
                if result.success {
                    self.put(store_key, result, ttl).await
                } else {
                    result
                }
            })
            .await
            .clone();

        self.inner.state.lock().await.land(&key, &flight);
        drop(guard);
        result
    }

    /// Runs [`evict_expired`](Self::evict_expired) every `every` until the
    /// returned handle is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                cache.evict_expired().await;
            }
        })
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            aliases: state.aliases.len(),
            tombstones: state.tombstones.len(),
            in_flight: state.in_flight.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use reelfetch_extract::models::{Extraction, MediaUrl};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn success() -> CanonicalResult {
        let url = MediaUrl::parse("https://cdn.example/v.mp4").unwrap();
        CanonicalResult::found(Extraction::new(url, "test"))
    }

    fn key() -> CacheKey {
        CacheKey::for_url("https://www.instagram.com/reel/ABCDEFGHIJ/")
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get() {
        let cache = ResultCache::default();
        let stored = cache.put(key(), success(), TTL).await;
        assert!(stored.id.is_some());
        assert_eq!(cache.get(&key()).await, Some(stored));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_get_no_id() {
        let cache = ResultCache::default();
        let stored = cache.put(key(), CanonicalResult::failed(Failure::AllStrategiesExhausted), TTL).await;
        assert_eq!(stored.id, None);
        assert_eq!(cache.stats().await.aliases, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_never_served() {
        let cache = ResultCache::default();
        cache.put(key(), success(), TTL).await;
        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        assert_eq!(cache.get(&key()).await, None);
        assert_eq!(cache.get(&key()).await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.aliases, 0);
        assert_eq!(stats.tombstones, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_by_id() {
        let cache = ResultCache::default();
        let stored = cache.put(key(), success(), TTL).await;
        let id = ResultId::from(stored.id.clone().unwrap());
        assert_eq!(cache.lookup(&id).await, Lookup::Found(stored));
        assert_eq!(cache.lookup(&ResultId::from("ffffffffffff")).await, Lookup::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_through_alias_removes_entry() {
        let cache = ResultCache::default();
        let stored = cache.put(key(), success(), TTL).await;
        let id = ResultId::from(stored.id.unwrap());
        tokio::time::advance(TTL * 2).await;
        assert_eq!(cache.lookup(&id).await, Lookup::Expired);
        assert_eq!(cache.stats().await.entries, 0);
        assert_eq!(cache.get(&key()).await, None);
        // Still reported as expired until the tombstone lapses.
        assert_eq!(cache.lookup(&id).await, Lookup::Expired);
        tokio::time::advance(DEFAULT_TOMBSTONE_RETENTION + Duration::from_secs(1)).await;
        assert_eq!(cache.lookup(&id).await, Lookup::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_retires_previous_id() {
        let cache = ResultCache::default();
        let first = cache.put(key(), success(), TTL).await;
        let second = cache.put(key(), success(), TTL).await;
        assert_ne!(first.id, second.id);
        let stats = cache.stats().await;
        assert_eq!((stats.entries, stats.aliases), (1, 1));
        assert_eq!(cache.lookup(&ResultId::from(first.id.unwrap())).await, Lookup::Expired);
        assert_eq!(cache.lookup(&ResultId::from(second.id.clone().unwrap())).await, Lookup::Found(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired() {
        let cache = ResultCache::new(Duration::from_secs(10));
        cache.put(CacheKey::for_url("a"), success(), Duration::from_secs(5)).await;
        cache.put(CacheKey::for_url("b"), success(), Duration::from_secs(5)).await;
        cache.put(CacheKey::for_url("c"), success(), Duration::from_secs(500)).await;
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.evict_expired().await, 2);
        assert_eq!(cache.stats().await, CacheStats { entries: 1, aliases: 1, tombstones: 2, in_flight: 0 });
        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.evict_expired().await, 0);
        assert_eq!(cache.stats().await.tombstones, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight() {
        let cache = ResultCache::default();
        let calls = &AtomicUsize::new(0);
        let resolve = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            success()
        };
        let results = futures::future::join_all((0..8).map(|_| cache.get_or_resolve(key(), TTL, resolve))).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let id = results[0].id.clone();
        assert!(id.is_some());
        assert!(results.iter().all(|r| r.id == id));
        assert_eq!(cache.stats().await.in_flight, 0);
        // Served from the cache from now on.
        cache.get_or_resolve(key(), TTL, resolve).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let cache = ResultCache::default();
        let calls = &AtomicUsize::new(0);
        let resolve = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            CanonicalResult::failed(Failure::AllStrategiesExhausted)
        };
        let first = cache.get_or_resolve(key(), TTL, resolve).await;
        let second = cache.get_or_resolve(key(), TTL, resolve).await;
        assert_eq!(first.error, Some(Failure::AllStrategiesExhausted));
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_resolutions_leave_no_marker() {
        let cache = ResultCache::default();
        for n in 0..5 {
            let key = CacheKey::for_url(&format!("https://www.instagram.com/reel/ABCDEFGHI{n}/"));
            let slow = cache.get_or_resolve(key, TTL, || async {
                tokio::time::sleep(Duration::from_secs(100)).await;
                success()
            });
            assert!(tokio::time::timeout(Duration::from_secs(1), slow).await.is_err());
        }
        assert_eq!(cache.stats().await.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_takes_over_cancelled_resolution() {
        let cache = ResultCache::default();
        let calls = &AtomicUsize::new(0);
        let resolve = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(10)).await;
            success()
        };
        let mut owner = Box::pin(cache.get_or_resolve(key(), TTL, resolve));
        assert!((&mut owner).now_or_never().is_none());
        let mut waiter = Box::pin(cache.get_or_resolve(key(), TTL, resolve));
        assert!((&mut waiter).now_or_never().is_none());
        drop(owner);
        assert_eq!(cache.stats().await.in_flight, 1);
        assert!(waiter.await.success);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().await.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_clears_abandoned_markers() {
        let cache = ResultCache::default();
        let mut slow = Box::pin(cache.get_or_resolve(key(), TTL, || async {
            tokio::time::sleep(Duration::from_secs(100)).await;
            success()
        }));
        assert!((&mut slow).now_or_never().is_none());
        // Cancelled while the state is busy, so the marker stays behind.
        let state = cache.inner.state.lock().await;
        drop(slow);
        drop(state);
        assert_eq!(cache.stats().await.in_flight, 1);
        cache.evict_expired().await;
        assert_eq!(cache.stats().await.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper() {
        let cache = ResultCache::default();
        cache.put(key(), success(), Duration::from_secs(1)).await;
        let sweeper = cache.spawn_sweeper(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(cache.stats().await.entries, 0);
        sweeper.abort();
    }

    #[test]
    fn test_lookup_into_result() {
        assert_eq!(CanonicalResult::from(Lookup::Expired).error, Some(Failure::Expired));
        assert_eq!(CanonicalResult::from(Lookup::NotFound).error, Some(Failure::NotFound));
    }
}
