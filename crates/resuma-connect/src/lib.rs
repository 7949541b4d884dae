//! Connection orchestration over the resuma session cache.
//!
//! This crate owns one connection attempt at a time: look up a resumable
//! session for the target peer, drive the external TLS engine (possibly with
//! a resumption hint), and fold the result back into the cache. The engine
//! itself (handshake state machine, record-layer crypto, certificate checks)
//! lives behind the [`TlsEngine`] trait and is never implemented here.
//!
//! The handshake is long-latency and failure-prone, so it always runs with
//! no cache lock held; concurrent attempts to different peers never contend.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use resuma_cache::{CacheConfig, PeerKey, SessionCache};
//! use resuma_connect::ConnectionCoordinator;
//!
//! let cache = Arc::new(SessionCache::new(CacheConfig::default()));
//! let coordinator = ConnectionCoordinator::new(cache, engine);
//!
//! let outcome = coordinator.connect(&PeerKey::new("example.com", 443)).await?;
//! println!("session {} (resumed: {})", outcome.session.id(), outcome.resumed);
//! ```

mod coordinator;
mod engine;
mod error;
mod observer;

pub use coordinator::{ConnectOutcome, ConnectPhase, ConnectionCoordinator};
pub use engine::{HandshakeError, Negotiated, ResumptionHint, TlsEngine};
pub use error::{Error, Result};
pub use observer::HandshakeObserver;
