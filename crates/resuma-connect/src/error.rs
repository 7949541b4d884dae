//! Error types for connection attempts.

use crate::engine::HandshakeError;

/// Error type for connection attempts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cache error: the peer key was rejected at the store boundary.
    #[error("cache error: {0}")]
    Cache(#[from] resuma_cache::Error),

    /// The external engine failed the handshake.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),
}

/// Result type for connection attempts.
pub type Result<T> = std::result::Result<T, Error>;
