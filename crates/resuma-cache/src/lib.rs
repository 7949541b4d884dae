//! Client-side TLS session cache with per-peer stores.
//!
//! This crate decides, on every new connection attempt, whether a previously
//! negotiated session can be resumed, and enforces eviction policy over the
//! set of cached sessions:
//! - insertion-order capacity eviction, bounded per store and across the cache
//! - lazy time-based expiry (a read-time filter, no background sweeper)
//! - explicit invalidation that immediately blocks reuse of a session
//!
//! Sessions are keyed per remote peer (host + port). The handshake itself is
//! not performed here; see the companion connect crate for orchestration.
//!
//! # Example
//!
//! ```rust,ignore
//! use resuma_cache::{CacheConfig, PeerKey, SessionCache};
//!
//! let cache = SessionCache::new(CacheConfig::default());
//! let peer = PeerKey::new("example.com", 443);
//!
//! if let Some(session) = cache.lookup(&peer)? {
//!     // offer `session` as a resumption hint to the TLS engine
//! }
//! ```

mod cache;
mod config;
mod error;
mod peer;
mod record;
mod store;

pub use cache::{CacheStats, SessionCache};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use peer::PeerKey;
pub use record::{SessionId, SessionRecord};
pub use store::PeerSessionStore;
