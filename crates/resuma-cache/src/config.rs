//! Configuration for the session cache.

use std::time::Duration;

/// Default capacity bound. Zero keeps every session until it expires or is
/// invalidated, matching the standard client session-context default.
pub const DEFAULT_MAX_SIZE: usize = 0;

/// Default expiry threshold (none by default, sessions don't age out).
pub const DEFAULT_TIMEOUT: Option<Duration> = None;

/// Configuration shared by all peer stores of a cache.
///
/// Both knobs are mutable at runtime through the owning
/// [`SessionCache`](crate::SessionCache), which pushes changes to every
/// existing store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Capacity bound on cached sessions, 0 = unbounded.
    pub max_size: usize,

    /// Expiry threshold for cached sessions, `None` = never expire.
    /// Expiry is enforced lazily at read time; there is no sweeper.
    pub timeout: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity bound (0 = unbounded).
    pub fn with_max_size(mut self, max: usize) -> Self {
        self.max_size = max;
        self
    }

    /// Set the expiry threshold.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable expiry (sessions don't age out).
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}
