//! Top-level registry mapping peers to their session stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::peer::PeerKey;
use crate::record::{SessionId, SessionRecord};
use crate::store::PeerSessionStore;

/// Client-side session cache, keyed per remote peer.
///
/// Owns the per-peer stores (created lazily, exactly once per key) and the
/// global configuration. The capacity bound is enforced at two levels with
/// the same value: each store trims itself on insert, and the cache trims
/// the total across stores in cache-wide insertion order, so with a bound
/// of `n` at most `n` sessions are resident no matter how many peers they
/// are spread over.
///
/// Lock discipline: the store map lock and each store's own lock are held
/// only for the brief critical sections of lookup, insert, invalidation, and
/// eviction. The handshake itself must run outside this crate entirely.
pub struct SessionCache {
    stores: RwLock<HashMap<PeerKey, Arc<PeerSessionStore>>>,
    config: Mutex<CacheConfig>,
    seq: Arc<AtomicU64>,
}

impl SessionCache {
    /// Create a cache with the given initial configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            config: Mutex::new(config),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> CacheConfig {
        self.config.lock().clone()
    }

    /// The store for `peer`, created on first access.
    ///
    /// Concurrent first accesses for the same key all observe the same store
    /// instance: the check-then-create runs under the map's write lock, so
    /// there is exactly one winner per key for the cache's lifetime.
    ///
    /// Fails with [`Error::InvalidPeer`](crate::Error::InvalidPeer) when the
    /// key has an empty host or a zero port.
    pub fn store_for(&self, peer: &PeerKey) -> Result<Arc<PeerSessionStore>> {
        peer.validate()?;

        if let Some(store) = self.stores.read().get(peer) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        let store = stores.entry(peer.clone()).or_insert_with(|| {
            let config = self.config.lock();
            debug!(peer = %peer, "creating session store");
            Arc::new(PeerSessionStore::new(
                peer.clone(),
                config.max_size,
                config.timeout,
                Arc::clone(&self.seq),
            ))
        });
        Ok(Arc::clone(store))
    }

    /// The most recent resumable session for `peer`, if any.
    pub fn lookup(&self, peer: &PeerKey) -> Result<Option<SessionRecord>> {
        Ok(self.store_for(peer)?.current())
    }

    /// Record a completed handshake's session for `peer`.
    pub fn record(&self, peer: &PeerKey, record: SessionRecord) -> Result<()> {
        let store = self.store_for(peer)?;
        store.insert(record);

        let max_size = self.config.lock().max_size;
        self.enforce_bound(max_size);
        Ok(())
    }

    /// Invalidate the session with `id` for `peer`. Idempotent; a silent
    /// no-op when the peer has no store or the store has no such record.
    pub fn invalidate(&self, peer: &PeerKey, id: &SessionId) {
        if let Some(store) = self.stores.read().get(peer) {
            store.invalidate(id);
        }
    }

    /// Set the capacity bound (0 = unbounded) and apply it to every existing
    /// store, evicting oldest-inserted sessions down to the new bound.
    pub fn set_session_cache_size(&self, max_size: usize) {
        self.config.lock().max_size = max_size;
        debug!(max_size, "session cache size updated");

        for store in self.stores.read().values() {
            store.set_max_size(max_size);
        }
        self.enforce_bound(max_size);
    }

    /// Set the expiry threshold in whole seconds (0 = no expiry) and apply
    /// it to every existing store. Nothing is evicted eagerly; expiry is
    /// enforced at read time.
    pub fn set_session_timeout(&self, secs: u64) {
        let timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self.config.lock().timeout = timeout;
        debug!(timeout_secs = secs, "session timeout updated");

        for store in self.stores.read().values() {
            store.set_timeout(timeout);
        }
    }

    /// Search every store for a live record with the given id.
    pub fn session(&self, id: &SessionId) -> Option<SessionRecord> {
        self.stores
            .read()
            .values()
            .find_map(|store| store.session(id))
    }

    /// Ids of all live sessions across all stores.
    pub fn ids(&self) -> Vec<SessionId> {
        self.stores
            .read()
            .values()
            .flat_map(|store| store.ids())
            .collect()
    }

    /// Number of peer stores created so far.
    pub fn peer_count(&self) -> usize {
        self.stores.read().len()
    }

    /// Snapshot of cache occupancy.
    pub fn stats(&self) -> CacheStats {
        let stores = self.stores.read();
        CacheStats {
            peers: stores.len(),
            sessions: stores.values().map(|s| s.len()).sum(),
        }
    }

    /// Trim total resident sessions down to `max_size` by evicting the
    /// globally oldest-inserted record, whichever store holds it.
    fn enforce_bound(&self, max_size: usize) {
        if max_size == 0 {
            return;
        }
        loop {
            let victim = {
                let stores = self.stores.read();
                let total: usize = stores.values().map(|s| s.len()).sum();
                if total <= max_size {
                    return;
                }
                stores
                    .values()
                    .filter_map(|store| store.oldest_seq().map(|seq| (seq, Arc::clone(store))))
                    .min_by_key(|(seq, _)| *seq)
            };
            match victim {
                Some((_, store)) => {
                    store.evict_oldest();
                }
                None => return,
            }
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of peer stores.
    pub peers: usize,

    /// Total resident sessions across all stores.
    pub sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Instant;

    fn record(id: &[u8]) -> SessionRecord {
        SessionRecord::new(SessionId::from(id), vec![0u8; 8], Instant::now())
    }

    fn peer(host: &str) -> PeerKey {
        PeerKey::new(host, 443)
    }

    #[test]
    fn test_store_for_returns_same_instance() {
        let cache = SessionCache::default();
        let a1 = cache.store_for(&peer("hostA")).unwrap();
        let a2 = cache.store_for(&peer("hostA")).unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(cache.peer_count(), 1);
    }

    #[test]
    fn test_distinct_peers_get_distinct_stores() {
        let cache = SessionCache::default();
        let a = cache.store_for(&peer("hostA")).unwrap();
        let b = cache.store_for(&peer("hostB")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        // same host, different port is a different peer
        let a2 = cache.store_for(&PeerKey::new("hostA", 8443)).unwrap();
        assert!(!Arc::ptr_eq(&a, &a2));
        assert_eq!(cache.peer_count(), 3);
    }

    #[test]
    fn test_malformed_peer_rejected() {
        let cache = SessionCache::default();
        assert!(matches!(
            cache.store_for(&PeerKey::new("", 443)),
            Err(Error::InvalidPeer(_))
        ));
        assert!(cache.lookup(&PeerKey::new("hostA", 0)).is_err());
        assert_eq!(cache.peer_count(), 0);
    }

    #[test]
    fn test_lookup_returns_recorded_session() {
        let cache = SessionCache::default();
        let p = peer("hostA");

        assert!(cache.lookup(&p).unwrap().is_none());
        cache.record(&p, record(b"a1")).unwrap();

        let found = cache.lookup(&p).unwrap().unwrap();
        assert_eq!(found.id(), &SessionId::from(&b"a1"[..]));
    }

    #[test]
    fn test_invalidate_blocks_resumption() {
        let cache = SessionCache::default();
        let p = peer("hostA");
        cache.record(&p, record(b"a1")).unwrap();

        cache.invalidate(&p, &SessionId::from(&b"a1"[..]));
        assert!(cache.lookup(&p).unwrap().is_none());
    }

    #[test]
    fn test_invalidate_without_store_is_noop() {
        let cache = SessionCache::default();
        cache.invalidate(&peer("unknown"), &SessionId::from(&b"x"[..]));
        assert_eq!(cache.peer_count(), 0);
    }

    #[test]
    fn test_bound_applies_across_peers_in_insertion_order() {
        let cache = SessionCache::default();
        let a = peer("hostA");
        let b = peer("hostB");

        cache.record(&a, record(b"a1")).unwrap();
        cache.record(&b, record(b"b1")).unwrap();

        // shrinking to one keeps only the most recently inserted session
        cache.set_session_cache_size(1);
        assert!(cache.lookup(&a).unwrap().is_none());
        assert_eq!(
            cache.lookup(&b).unwrap().unwrap().id(),
            &SessionId::from(&b"b1"[..])
        );

        // a new session for A pushes B's out
        cache.record(&a, record(b"a2")).unwrap();
        assert!(cache.lookup(&b).unwrap().is_none());
        assert_eq!(
            cache.lookup(&a).unwrap().unwrap().id(),
            &SessionId::from(&b"a2"[..])
        );
        assert_eq!(cache.stats().sessions, 1);
    }

    #[test]
    fn test_unbounded_reset_keeps_sessions() {
        let cache = SessionCache::default();
        cache.set_session_cache_size(1);
        cache.set_session_cache_size(0);

        let a = peer("hostA");
        let b = peer("hostB");
        cache.record(&a, record(b"a1")).unwrap();
        cache.record(&b, record(b"b1")).unwrap();

        assert!(cache.lookup(&a).unwrap().is_some());
        assert!(cache.lookup(&b).unwrap().is_some());
    }

    #[test]
    fn test_timeout_pushed_to_existing_stores() {
        let cache = SessionCache::default();
        let p = peer("hostA");
        let backdated = SessionRecord::new(
            SessionId::from(&b"old"[..]),
            vec![],
            Instant::now() - Duration::from_secs(10),
        );
        cache.record(&p, backdated).unwrap();

        assert!(cache.lookup(&p).unwrap().is_some());
        cache.set_session_timeout(5);
        assert!(cache.lookup(&p).unwrap().is_none());

        cache.set_session_timeout(0);
        assert!(cache.lookup(&p).unwrap().is_some());
    }

    #[test]
    fn test_new_store_inherits_config() {
        let cache = SessionCache::default();
        cache.set_session_timeout(5);

        let p = peer("hostA");
        let backdated = SessionRecord::new(
            SessionId::from(&b"old"[..]),
            vec![],
            Instant::now() - Duration::from_secs(10),
        );
        cache.record(&p, backdated).unwrap();
        assert!(cache.lookup(&p).unwrap().is_none());
    }

    #[test]
    fn test_session_and_ids_span_stores() {
        let cache = SessionCache::default();
        cache.record(&peer("hostA"), record(b"a1")).unwrap();
        cache.record(&peer("hostB"), record(b"b1")).unwrap();

        assert!(cache.session(&SessionId::from(&b"a1"[..])).is_some());
        assert!(cache.session(&SessionId::from(&b"nope"[..])).is_none());

        let mut ids = cache.ids();
        ids.sort_by(|x, y| x.as_bytes().cmp(y.as_bytes()));
        assert_eq!(
            ids,
            vec![SessionId::from(&b"a1"[..]), SessionId::from(&b"b1"[..])]
        );
    }

    #[test]
    fn test_stats() {
        let cache = SessionCache::default();
        cache.record(&peer("hostA"), record(b"a1")).unwrap();
        cache.record(&peer("hostA"), record(b"a2")).unwrap();
        cache.record(&peer("hostB"), record(b"b1")).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.peers, 2);
        assert_eq!(stats.sessions, 3);
    }
}
