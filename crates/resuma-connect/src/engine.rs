//! The handshake seam — the external TLS engine the coordinator drives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use resuma_cache::{PeerKey, SessionId};

/// Failure surfaced by the engine for one handshake attempt.
///
/// Opaque to this layer: errors propagate to the caller untouched, never
/// mutate the cache, and are not retried here (retry policy belongs to the
/// caller).
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The peer refused the connection.
    #[error("connection refused by {0}")]
    Refused(String),

    /// The handshake did not complete in time.
    #[error("handshake timed out after {0:?}")]
    TimedOut(Duration),

    /// Protocol-level failure from the TLS stack.
    #[error("protocol failure: {0}")]
    Protocol(String),
}

/// A cached session offered to the engine for resumption.
///
/// Advisory only: the engine may resume with it or negotiate a fresh
/// session, and tells the caller which happened through the id it returns.
#[derive(Debug, Clone)]
pub struct ResumptionHint {
    /// Id of the session to resume.
    pub id: SessionId,

    /// Resumption material captured when the session was established.
    pub material: Arc<[u8]>,
}

/// Outcome of a completed handshake.
#[derive(Debug, Clone)]
pub struct Negotiated {
    /// Final negotiated session id. Equal to the hint's id exactly when the
    /// engine actually resumed.
    pub id: SessionId,

    /// Material for resuming this session later.
    pub material: Arc<[u8]>,

    /// When the session was established.
    pub established_at: Instant,
}

/// The external TLS engine this crate wraps.
///
/// Implementations perform the real handshake and record-layer work. The
/// coordinator holds no cache lock across `handshake`, so implementations
/// are free to block on the network for as long as they need.
#[async_trait]
pub trait TlsEngine: Send + Sync {
    /// Run one handshake with `peer`.
    ///
    /// A hint, when present, names the cached session the caller would like
    /// to resume. The engine independently decides whether resumption
    /// happens; callers must not assume it did merely because a hint was
    /// offered. Only an identical returned id means resumed.
    async fn handshake(
        &self,
        peer: &PeerKey,
        hint: Option<ResumptionHint>,
    ) -> Result<Negotiated, HandshakeError>;
}
