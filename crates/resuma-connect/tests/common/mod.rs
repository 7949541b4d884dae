//! Shared test support: an in-memory stand-in for the TLS engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;

use resuma_cache::{PeerKey, SessionId};
use resuma_connect::{HandshakeError, Negotiated, ResumptionHint, TlsEngine};

/// Engine stand-in that models per-peer server-side acceptance: a hint
/// resumes only while the "server" for that peer still holds the session.
/// Fresh sessions get random ids, like real ticket issuance.
pub struct ScriptedEngine {
    accepted: Mutex<HashMap<PeerKey, HashSet<SessionId>>>,
    resumption_enabled: bool,
    refuse_all: AtomicBool,
    handshakes: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            accepted: Mutex::new(HashMap::new()),
            resumption_enabled: true,
            refuse_all: AtomicBool::new(false),
            handshakes: AtomicUsize::new(0),
        }
    }

    /// An engine that never resumes: every handshake negotiates fresh.
    pub fn without_resumption() -> Self {
        Self {
            resumption_enabled: false,
            ..Self::new()
        }
    }

    /// Make every subsequent handshake fail (or succeed again).
    pub fn set_refuse_all(&self, refuse: bool) {
        self.refuse_all.store(refuse, Ordering::Relaxed);
    }

    /// Total handshakes attempted.
    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::Relaxed)
    }

    fn fresh(&self, peer: &PeerKey) -> Negotiated {
        let bytes = uuid::Uuid::new_v4().into_bytes().to_vec();
        let id = SessionId::new(bytes.clone());
        self.accepted
            .lock()
            .entry(peer.clone())
            .or_default()
            .insert(id.clone());
        Negotiated {
            id,
            material: Arc::from(bytes),
            established_at: Instant::now(),
        }
    }
}

#[async_trait]
impl TlsEngine for ScriptedEngine {
    async fn handshake(
        &self,
        peer: &PeerKey,
        hint: Option<ResumptionHint>,
    ) -> Result<Negotiated, HandshakeError> {
        self.handshakes.fetch_add(1, Ordering::Relaxed);

        if self.refuse_all.load(Ordering::Relaxed) {
            return Err(HandshakeError::Refused(peer.to_string()));
        }

        if self.resumption_enabled {
            if let Some(hint) = hint {
                let accepted = self.accepted.lock();
                if accepted.get(peer).is_some_and(|held| held.contains(&hint.id)) {
                    return Ok(Negotiated {
                        id: hint.id,
                        material: hint.material,
                        established_at: Instant::now(),
                    });
                }
            }
        }

        Ok(self.fresh(peer))
    }
}
