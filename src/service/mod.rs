//! Wires the anchor's dependencies together into one `Arc<ServiceContainer>`
//! shared as axum `State`, the same composition-root pattern the teacher
//! uses for its own `ServiceContainer`.

pub mod auth_service;
pub mod transfer_service;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::discovery;
use crate::hooks::{DefaultSep24Hooks, DefaultSep6Hooks, Sep24Hooks, Sep6Hooks};
use crate::horizon::HorizonClient;
use crate::nonce::NonceRegistry;
use crate::storage::memory::InMemoryTransferStore;
use crate::storage::TransferStore;

pub struct ServiceContainer {
    pub config: Config,
    pub nonces: Arc<NonceRegistry>,
    pub horizon: HorizonClient,
    pub transfers: Arc<dyn TransferStore>,
    pub sep24_hooks: Arc<dyn Sep24Hooks>,
    pub sep6_hooks: Arc<dyn Sep6Hooks>,
    /// Cached `stellar.toml` rendering (`spec.md` §4.1, "Caching"),
    /// invalidated by `invalidate_discovery_cache` on mount-set/config
    /// mutation.
    discovery_cache: RwLock<Option<Arc<str>>>,
}

impl ServiceContainer {
    pub fn new(config: Config) -> Self {
        let horizon_url = config.horizon_url();
        Self {
            config,
            nonces: Arc::new(NonceRegistry::new()),
            horizon: HorizonClient::new(horizon_url),
            transfers: Arc::new(InMemoryTransferStore::new()),
            sep24_hooks: Arc::new(DefaultSep24Hooks),
            sep6_hooks: Arc::new(DefaultSep6Hooks),
            discovery_cache: RwLock::new(None),
        }
    }

    pub fn with_sep24_hooks(mut self, hooks: Arc<dyn Sep24Hooks>) -> Self {
        self.sep24_hooks = hooks;
        self
    }

    pub fn with_sep6_hooks(mut self, hooks: Arc<dyn Sep6Hooks>) -> Self {
        self.sep6_hooks = hooks;
        self
    }

    /// The signing keypair derived from `config.secret_key`.
    pub fn signing_keypair(&self) -> stellar_base::crypto::KeyPair {
        self.config.signing_keypair()
    }

    pub fn network(&self) -> stellar_base::network::Network {
        stellar_base::network::Network::new(self.config.network.passphrase().to_string())
    }

    /// Render (or return the cached rendering of) the SEP-1 discovery
    /// document, per `spec.md` §4.1.
    pub async fn discovery_document(&self) -> Arc<str> {
        if let Some(cached) = self.discovery_cache.read().await.clone() {
            return cached;
        }

        let mut slot = self.discovery_cache.write().await;
        if let Some(cached) = slot.clone() {
            return cached;
        }
        let rendered: Arc<str> = discovery::render(&self.config).into();
        *slot = Some(rendered.clone());
        rendered
    }

    /// Invalidate the cached discovery document. The anchor's config and
    /// mount set are fixed for the life of the process, so nothing calls
    /// this today, but it is the hook a runtime reconfiguration feature
    /// would use (`spec.md` §4.1, "Caching").
    pub async fn invalidate_discovery_cache(&self) {
        *self.discovery_cache.write().await = None;
    }
}
