//! Replay protection for SEP-10 challenges (`spec.md` §4.2.1). A nonce is
//! registered when a challenge is issued, consumed exactly once at verify
//! time, and swept out after its TTL. `dashmap` gives us the "multi-writer,
//! multi-reader, internally serialized" property `spec.md` §5 asks for
//! without a hand-rolled lock, the same way the teacher reaches for
//! `dashmap` elsewhere in the stack.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const NONCE_TTL_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
struct NonceEntry {
    inserted_at: DateTime<Utc>,
    consumed: bool,
}

#[derive(Default)]
pub struct NonceRegistry {
    entries: DashMap<Vec<u8>, NonceEntry>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert a freshly minted nonce. Rejects (returns `false`) if the
    /// value is already present — nonces must never be silently replaced.
    pub fn add(&self, nonce: &[u8]) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.entries.entry(nonce.to_vec()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(NonceEntry {
                    inserted_at: Utc::now(),
                    consumed: false,
                });
                true
            }
        }
    }

    pub fn has(&self, nonce: &[u8]) -> bool {
        self.entries.contains_key(nonce)
    }

    /// Returns `true` iff the nonce was present and not yet consumed, and
    /// marks it consumed as a side effect of that check — the single
    /// atomic operation `spec.md` §4.2 step 4 requires.
    pub fn consume(&self, nonce: &[u8]) -> bool {
        match self.entries.get_mut(nonce) {
            Some(mut entry) if !entry.consumed && !is_expired(entry.inserted_at) => {
                entry.consumed = true;
                true
            }
            _ => false,
        }
    }

    fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, v| !is_expired(v.inserted_at));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_expired(inserted_at: DateTime<Utc>) -> bool {
    Utc::now() - inserted_at > ChronoDuration::seconds(NONCE_TTL_SECONDS)
}

/// Spawn the periodic sweeper. Cancellable via `token` so `shutdown` can
/// stop it cleanly (`spec.md` §5, "Cancellation").
pub fn spawn_sweeper(registry: Arc<NonceRegistry>, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(NONCE_TTL_SECONDS as u64));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let swept = registry.sweep();
                    if swept > 0 {
                        debug!(swept, "nonce sweeper removed expired entries");
                    }
                }
                _ = token.cancelled() => {
                    info!("nonce sweeper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_duplicate() {
        let reg = NonceRegistry::new();
        assert!(reg.add(b"nonce-a"));
        assert!(!reg.add(b"nonce-a"));
    }

    #[test]
    fn consume_is_single_use() {
        let reg = NonceRegistry::new();
        reg.add(b"nonce-a");
        assert!(reg.consume(b"nonce-a"));
        assert!(!reg.consume(b"nonce-a"));
    }

    #[test]
    fn consume_unknown_nonce_fails() {
        let reg = NonceRegistry::new();
        assert!(!reg.consume(b"never-added"));
    }

    #[test]
    fn has_reflects_presence() {
        let reg = NonceRegistry::new();
        assert!(!reg.has(b"nonce-a"));
        reg.add(b"nonce-a");
        assert!(reg.has(b"nonce-a"));
    }
}
