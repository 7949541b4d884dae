//! Error types for cache operations.

/// Error type for session cache operations.
///
/// Cache mutations themselves are total functions; the only failure the
/// cache can surface is a malformed peer key at the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Peer key is malformed (empty host or zero port).
    #[error("invalid peer key: {0}")]
    InvalidPeer(String),
}

/// Result type for session cache operations.
pub type Result<T> = std::result::Result<T, Error>;
