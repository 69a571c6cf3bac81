//! The storage port (`spec.md` §4.4): a trait the transfer engine depends
//! on, with an in-memory default adapter. Mirrors the teacher's
//! `StorageAdapter` trait shape in `storage/mod.rs` — an `async_trait`
//! interface the service layer is generic over, so a durable adapter can
//! be swapped in later without touching `service::transfer_service`.

pub mod memory;

use async_trait::async_trait;

use crate::models::{Transfer, TransferListFilter, TransferStatusUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("transfer not found")]
    NotFound,
    #[error("interactive token already consumed or unknown")]
    TokenInvalid,
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn create(&self, transfer: Transfer) -> Result<Transfer, StorageError>;

    async fn get_by_id(&self, id: &str) -> Result<Transfer, StorageError>;

    async fn get_by_interactive_token(&self, token: &str) -> Result<Transfer, StorageError>;

    async fn get_by_on_chain_id(&self, stellar_transaction_id: &str) -> Result<Transfer, StorageError>;

    async fn get_by_external_id(&self, external_transaction_id: &str) -> Result<Transfer, StorageError>;

    async fn list_by_account(
        &self,
        account: &str,
        filter: &TransferListFilter,
    ) -> Result<Vec<Transfer>, StorageError>;

    async fn update(&self, id: &str, update: TransferStatusUpdate) -> Result<Transfer, StorageError>;

    /// Atomically mark the transfer's interactive token consumed and move
    /// its status forward, failing if `id`/`token` don't match the same
    /// transfer or the token was already consumed or has expired — the
    /// single race the interactive flow must close (`spec.md` §4.3,
    /// invariant I5). `decide` is invoked with the transfer's state as it
    /// stood immediately before the mutation and returns the update to
    /// apply in the same critical section, so "what status comes next"
    /// never has to be decided from a stale read.
    async fn complete_interactive(
        &self,
        id: &str,
        token: &str,
        decide: Box<dyn FnOnce(&Transfer) -> TransferStatusUpdate + Send>,
    ) -> Result<Transfer, StorageError>;

    async fn delete(&self, id: &str) -> Result<(), StorageError>;
}
