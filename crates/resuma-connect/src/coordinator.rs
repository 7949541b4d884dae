//! One-connection-at-a-time orchestration over the session cache.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use resuma_cache::{PeerKey, SessionCache, SessionId, SessionRecord};

use crate::engine::{ResumptionHint, TlsEngine};
use crate::error::Result;
use crate::observer::HandshakeObserver;

/// Phase of a single connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPhase {
    /// Attempt created, nothing done yet.
    Idle,
    /// Querying the cache for a resumable session.
    LookingUp,
    /// Waiting on the external engine.
    Handshaking,
    /// Handshake succeeded and the result is in the cache.
    Completed,
    /// Handshake failed; the cache was left untouched.
    Failed,
}

/// Result of a successful connection attempt.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    /// The session now current for the peer.
    pub session: SessionRecord,

    /// Whether the engine resumed the hinted session instead of
    /// negotiating a fresh one.
    pub resumed: bool,
}

/// Per-attempt phase tracking, surfaced through tracing.
struct Attempt<'a> {
    peer: &'a PeerKey,
    phase: ConnectPhase,
}

impl Attempt<'_> {
    fn start(peer: &PeerKey) -> Attempt<'_> {
        Attempt {
            peer,
            phase: ConnectPhase::Idle,
        }
    }

    fn advance(&mut self, next: ConnectPhase) {
        trace!(peer = %self.peer, from = ?self.phase, to = ?next, "connection phase");
        self.phase = next;
    }
}

/// Orchestrates connection attempts against the shared session cache.
///
/// Each [`connect`](Self::connect) call runs one attempt: cache lookup,
/// handshake (with no cache lock held), then a cache update, but only when
/// the engine negotiated a session the cache has not seen. Dropping the
/// future before completion leaves the cache untouched, since its only
/// mutation happens after the handshake resolves.
pub struct ConnectionCoordinator {
    cache: Arc<SessionCache>,
    engine: Arc<dyn TlsEngine>,
    observers: RwLock<Vec<Arc<dyn HandshakeObserver>>>,
}

impl ConnectionCoordinator {
    /// Create a coordinator over the given cache and engine.
    pub fn new(cache: Arc<SessionCache>, engine: Arc<dyn TlsEngine>) -> Self {
        Self {
            cache,
            engine,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// The cache this coordinator records into.
    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Register an observer for completed handshakes.
    pub fn add_observer(&self, observer: Arc<dyn HandshakeObserver>) {
        self.observers.write().push(observer);
    }

    /// Run one connection attempt against `peer`.
    ///
    /// A cached session, when present, is offered to the engine as a
    /// resumption hint. If the engine returns the hinted id, the existing
    /// record is kept as-is: its establishment time is not refreshed, so
    /// resumption never resets the expiry clock. Any other id is recorded
    /// as a fresh session. On handshake failure the error propagates and
    /// the cache is not mutated.
    pub async fn connect(&self, peer: &PeerKey) -> Result<ConnectOutcome> {
        let mut attempt = Attempt::start(peer);

        attempt.advance(ConnectPhase::LookingUp);
        let resumable = self.cache.lookup(peer)?;
        let hint = resumable.as_ref().map(|record| ResumptionHint {
            id: record.id().clone(),
            material: Arc::clone(record.material()),
        });

        attempt.advance(ConnectPhase::Handshaking);
        // no cache lock is held across this await
        let negotiated = match self.engine.handshake(peer, hint).await {
            Ok(negotiated) => negotiated,
            Err(err) => {
                attempt.advance(ConnectPhase::Failed);
                debug!(peer = %peer, error = %err, "handshake failed");
                return Err(err.into());
            }
        };

        let (session, resumed) = match resumable {
            Some(existing) if *existing.id() == negotiated.id => {
                trace!(peer = %peer, session_id = %existing.id(), "session resumed");
                (existing, true)
            }
            _ => {
                let record = SessionRecord::new(
                    negotiated.id,
                    negotiated.material,
                    negotiated.established_at,
                );
                self.cache.record(peer, record.clone())?;
                (record, false)
            }
        };

        attempt.advance(ConnectPhase::Completed);
        debug!(peer = %peer, session_id = %session.id(), resumed, "connection completed");
        self.notify_completed(peer, session.id());

        Ok(ConnectOutcome { session, resumed })
    }

    /// Invalidate a session for `peer`, immediately blocking its reuse.
    /// Exposed for upper layers reacting to session misuse or close.
    pub fn invalidate_active(&self, peer: &PeerKey, id: &SessionId) {
        self.cache.invalidate(peer, id);
    }

    /// Notify observers outside all locks: an observer may block its own
    /// attempt, but it can never deadlock the cache or the observer list.
    fn notify_completed(&self, peer: &PeerKey, id: &SessionId) {
        let observers: Vec<_> = self.observers.read().iter().map(Arc::clone).collect();
        for observer in observers {
            observer.handshake_completed(peer, id);
        }
    }
}
