//! Handshake-completion observers.

use resuma_cache::{PeerKey, SessionId};

/// Observer notified once per completed handshake.
///
/// Registered on the [`ConnectionCoordinator`](crate::ConnectionCoordinator)
/// and invoked synchronously after the result has been recorded, outside all
/// cache locks. The id passed is the final negotiated one: the hinted id on
/// resumption, a fresh id otherwise.
pub trait HandshakeObserver: Send + Sync {
    /// Called exactly once for each handshake that reaches completion.
    fn handshake_completed(&self, peer: &PeerKey, session_id: &SessionId);
}
