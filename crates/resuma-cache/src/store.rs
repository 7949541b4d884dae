//! Per-peer bounded, time-aware session store.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::peer::PeerKey;
use crate::record::{SessionId, SessionRecord};

/// A record plus its cache-wide insertion sequence number.
///
/// Sequence numbers come from a counter shared by every store of one cache,
/// so "oldest inserted across the cache" is a total order even though each
/// store only sees its own slice of it.
struct Entry {
    seq: u64,
    record: SessionRecord,
}

/// Inner state guarded by the store mutex.
struct StoreInner {
    records: VecDeque<Entry>,
    max_size: usize,
    timeout: Option<Duration>,
}

/// Bounded, time-aware collection of sessions for one peer.
///
/// Records are kept in insertion order with the newest at the back. Capacity
/// eviction drops the oldest-inserted record first: insertion recency is the
/// only ordering that matters, not read access. Expiry is a read-time filter;
/// nothing sweeps the store in the background, though write paths
/// opportunistically drop entries no query could ever return.
///
/// Stores are created by their owning [`SessionCache`](crate::SessionCache)
/// on first connection to a peer and live until the cache is torn down; an
/// empty store is harmless and inert.
pub struct PeerSessionStore {
    peer: PeerKey,
    seq: Arc<AtomicU64>,
    inner: Mutex<StoreInner>,
}

impl PeerSessionStore {
    pub(crate) fn new(
        peer: PeerKey,
        max_size: usize,
        timeout: Option<Duration>,
        seq: Arc<AtomicU64>,
    ) -> Self {
        Self {
            peer,
            seq,
            inner: Mutex::new(StoreInner {
                records: VecDeque::new(),
                max_size,
                timeout,
            }),
        }
    }

    /// The peer this store serves.
    pub fn peer(&self) -> &PeerKey {
        &self.peer
    }

    /// Append a session as the newest record for this peer.
    ///
    /// An existing record with the same id is replaced (renegotiating an
    /// identical id must not leave duplicates). If a non-zero capacity bound
    /// would be exceeded, the oldest-inserted records are evicted first.
    pub fn insert(&self, record: SessionRecord) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();

        let timeout = inner.timeout;
        inner
            .records
            .retain(|e| e.record.id() != record.id() && e.record.is_valid() && !e.record.is_expired(timeout));

        trace!(
            peer = %self.peer,
            session_id = %record.id(),
            size = inner.records.len() + 1,
            "session cached"
        );
        inner.records.push_back(Entry { seq, record });
        Self::evict_over_bound(&mut inner, &self.peer);
    }

    /// Most recently inserted record that is still valid and unexpired.
    ///
    /// Expiry is evaluated here, at read time; nothing is removed. The
    /// returned record's last-access stamp is refreshed (bookkeeping only;
    /// it plays no part in eviction ordering).
    pub fn current(&self) -> Option<SessionRecord> {
        let mut inner = self.inner.lock();
        let timeout = inner.timeout;
        for entry in inner.records.iter_mut().rev() {
            if entry.record.is_valid() && !entry.record.is_expired(timeout) {
                entry.record.touch();
                trace!(peer = %self.peer, session_id = %entry.record.id(), "resumable session found");
                return Some(entry.record.clone());
            }
        }
        trace!(peer = %self.peer, "no resumable session");
        None
    }

    /// Mark the record with the given id as invalid. Idempotent; a silent
    /// no-op when no such record exists.
    pub fn invalidate(&self, id: &SessionId) {
        let mut inner = self.inner.lock();
        for entry in inner.records.iter_mut() {
            if entry.record.id() == id && entry.record.is_valid() {
                entry.record.invalidate();
                debug!(peer = %self.peer, session_id = %id, "session invalidated");
            }
        }
    }

    /// Update the capacity bound, evicting oldest-inserted records if the
    /// store is now over it.
    pub fn set_max_size(&self, max_size: usize) {
        let mut inner = self.inner.lock();
        inner.max_size = max_size;
        Self::evict_over_bound(&mut inner, &self.peer);
    }

    /// Update the expiry threshold. Takes effect on the next read; expiry
    /// is a read-time filter, so nothing is evicted eagerly.
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.inner.lock().timeout = timeout;
    }

    /// Look up a live (valid, unexpired) record by id.
    pub fn session(&self, id: &SessionId) -> Option<SessionRecord> {
        let inner = self.inner.lock();
        let timeout = inner.timeout;
        inner
            .records
            .iter()
            .find(|e| e.record.id() == id && e.record.is_valid() && !e.record.is_expired(timeout))
            .map(|e| e.record.clone())
    }

    /// Ids of all live records, oldest inserted first.
    pub fn ids(&self) -> Vec<SessionId> {
        let inner = self.inner.lock();
        let timeout = inner.timeout;
        inner
            .records
            .iter()
            .filter(|e| e.record.is_valid() && !e.record.is_expired(timeout))
            .map(|e| e.record.id().clone())
            .collect()
    }

    /// Number of resident records. Counts everything still occupying a slot,
    /// including records that expiry would filter out of reads.
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Check whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Insertion sequence of the oldest resident record, if any.
    pub(crate) fn oldest_seq(&self) -> Option<u64> {
        self.inner.lock().records.front().map(|e| e.seq)
    }

    /// Evict the oldest-inserted resident record. Used by the owning cache
    /// to enforce the bound across stores.
    pub(crate) fn evict_oldest(&self) -> Option<SessionId> {
        let mut inner = self.inner.lock();
        inner.records.pop_front().map(|e| {
            debug!(peer = %self.peer, session_id = %e.record.id(), "session evicted by cache bound");
            e.record.id().clone()
        })
    }

    fn evict_over_bound(inner: &mut StoreInner, peer: &PeerKey) {
        if inner.max_size == 0 {
            return;
        }
        while inner.records.len() > inner.max_size {
            if let Some(evicted) = inner.records.pop_front() {
                debug!(
                    peer = %peer,
                    session_id = %evicted.record.id(),
                    max_size = inner.max_size,
                    "session evicted by store bound"
                );
            }
        }
    }
}
