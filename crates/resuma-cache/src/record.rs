//! Session identity and the cached record entity.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Opaque identifier for a negotiated TLS session.
///
/// Ids are produced by the handshake engine and treated as raw bytes here;
/// equality and hashing are byte-wise.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Box<[u8]>);

impl SessionId {
    /// Create a session id from raw bytes.
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the id in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SessionId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for SessionId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short hex prefix, enough to correlate log lines
        let prefix = &self.0[..self.0.len().min(8)];
        write!(f, "{}", hex::encode(prefix))?;
        if self.0.len() > 8 {
            write!(f, "..")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

/// A single negotiated session held for resumption.
///
/// The id, material, and creation time are fixed at construction. Validity
/// starts true and can only ever transition to false (via invalidation);
/// an invalid record is never offered for resumption again.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    id: SessionId,
    material: Arc<[u8]>,
    created_at: Instant,
    last_access: Instant,
    valid: bool,
}

impl SessionRecord {
    /// Create a record for a session established at `established_at`.
    pub fn new(id: SessionId, material: impl Into<Arc<[u8]>>, established_at: Instant) -> Self {
        Self {
            id,
            material: material.into(),
            created_at: established_at,
            last_access: established_at,
            valid: true,
        }
    }

    /// The session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Opaque resumption material, cheap to clone.
    pub fn material(&self) -> &Arc<[u8]> {
        &self.material
    }

    /// When the session was established. Resumption does not refresh this.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the session was last returned by a current-session query.
    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// Whether the session may still be offered for resumption.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Age of the session since establishment.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Check the record against an expiry threshold (`None` = never expires).
    pub fn is_expired(&self, timeout: Option<Duration>) -> bool {
        match timeout {
            None => false,
            Some(timeout) => self.age() >= timeout,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }
}
