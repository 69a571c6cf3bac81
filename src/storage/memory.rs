//! Default in-memory `TransferStore`, backed by `dashmap` the same way
//! `NonceRegistry` is — no external database is required to run the
//! anchor, per `spec.md` §4.4.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{StorageError, TransferStore};
use crate::models::{Transfer, TransferListFilter, TransferStatusUpdate};

#[derive(Default)]
pub struct InMemoryTransferStore {
    by_id: DashMap<String, Transfer>,
    id_by_token: DashMap<String, String>,
    id_by_stellar_tx: DashMap<String, String>,
    id_by_external_tx: DashMap<String, String>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, transfer: &Transfer) {
        if let Some(token) = &transfer.interactive_token {
            self.id_by_token.insert(token.value.clone(), transfer.id.clone());
        }
        if let Some(stellar_tx) = &transfer.stellar_transaction_id {
            self.id_by_stellar_tx.insert(stellar_tx.clone(), transfer.id.clone());
        }
        if let Some(external_tx) = &transfer.external_transaction_id {
            self.id_by_external_tx
                .insert(external_tx.clone(), transfer.id.clone());
        }
    }

    fn apply_update(transfer: &mut Transfer, update: TransferStatusUpdate) {
        transfer.status = update.status;
        if update.stellar_transaction_id.is_some() {
            transfer.stellar_transaction_id = update.stellar_transaction_id;
        }
        if update.external_transaction_id.is_some() {
            transfer.external_transaction_id = update.external_transaction_id;
        }
        if update.status_message.is_some() {
            transfer.status_message = update.status_message;
        }
        if update.amount.is_some() {
            transfer.amount = update.amount;
        }
        transfer.updated_at = Utc::now();
        if transfer.status.is_terminal() {
            transfer.completed_at = Some(transfer.updated_at);
        } else {
            transfer.completed_at = None;
        }
    }
}

#[async_trait]
impl TransferStore for InMemoryTransferStore {
    async fn create(&self, transfer: Transfer) -> Result<Transfer, StorageError> {
        self.index(&transfer);
        self.by_id.insert(transfer.id.clone(), transfer.clone());
        Ok(transfer)
    }

    async fn get_by_id(&self, id: &str) -> Result<Transfer, StorageError> {
        self.by_id
            .get(id)
            .map(|entry| entry.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn get_by_interactive_token(&self, token: &str) -> Result<Transfer, StorageError> {
        let id = self.id_by_token.get(token).ok_or(StorageError::NotFound)?;
        self.get_by_id(&id).await
    }

    async fn get_by_on_chain_id(&self, stellar_transaction_id: &str) -> Result<Transfer, StorageError> {
        let id = self
            .id_by_stellar_tx
            .get(stellar_transaction_id)
            .ok_or(StorageError::NotFound)?;
        self.get_by_id(&id).await
    }

    async fn get_by_external_id(&self, external_transaction_id: &str) -> Result<Transfer, StorageError> {
        let id = self
            .id_by_external_tx
            .get(external_transaction_id)
            .ok_or(StorageError::NotFound)?;
        self.get_by_id(&id).await
    }

    async fn list_by_account(
        &self,
        account: &str,
        filter: &TransferListFilter,
    ) -> Result<Vec<Transfer>, StorageError> {
        let mut results: Vec<Transfer> = self
            .by_id
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|t| t.account == account)
            .filter(|t| filter.asset_code.as_deref().map_or(true, |c| c == t.asset_code))
            .filter(|t| filter.kind.map_or(true, |k| k == t.kind))
            .filter(|t| filter.not_older_than.map_or(true, |ts| t.created_at >= ts))
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = filter.limit {
            results.truncate(limit.max(0) as usize);
        }

        Ok(results)
    }

    async fn update(&self, id: &str, update: TransferStatusUpdate) -> Result<Transfer, StorageError> {
        let mut entry = self.by_id.get_mut(id).ok_or(StorageError::NotFound)?;
        Self::apply_update(&mut entry, update);
        let updated = entry.clone();
        drop(entry);
        self.index(&updated);
        Ok(updated)
    }

    async fn complete_interactive(
        &self,
        id: &str,
        token: &str,
        decide: Box<dyn FnOnce(&Transfer) -> TransferStatusUpdate + Send>,
    ) -> Result<Transfer, StorageError> {
        let mut entry = self.by_id.get_mut(id).ok_or(StorageError::TokenInvalid)?;

        {
            let token_state = entry
                .interactive_token
                .as_ref()
                .ok_or(StorageError::TokenInvalid)?;

            if token_state.value != token || !token_state.is_valid(Utc::now()) {
                return Err(StorageError::TokenInvalid);
            }
        }

        let update = decide(&entry);

        entry.interactive_token.as_mut().unwrap().consumed = true;
        Self::apply_update(&mut entry, update);
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.by_id.remove(id).ok_or(StorageError::NotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TransferKind, TransferMode, TransferStatus};
    use uuid::Uuid;

    fn sample_transfer() -> Transfer {
        let now = Utc::now();
        Transfer {
            id: Uuid::new_v4().to_string(),
            kind: TransferKind::Deposit,
            mode: TransferMode::Interactive,
            status: TransferStatus::Incomplete,
            asset_code: "USD".into(),
            asset_issuer: Some("GISSUER".into()),
            account: "GACCOUNT".into(),
            amount: None,
            destination: None,
            destination_extra: None,
            memo: None,
            memo_type: None,
            interactive_token: Some(crate::models::InteractiveToken {
                value: "tok-1".into(),
                created_at: now,
                expires_at: now + chrono::Duration::minutes(15),
                consumed: false,
            }),
            interactive_url: None,
            more_info_url: "https://anchor.example.com/more_info".into(),
            stellar_transaction_id: None,
            external_transaction_id: None,
            status_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn create_then_get_by_id_round_trips() {
        let store = InMemoryTransferStore::new();
        let transfer = sample_transfer();
        let id = transfer.id.clone();
        store.create(transfer).await.unwrap();

        let fetched = store.get_by_id(&id).await.unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn complete_interactive_is_single_use() {
        let store = InMemoryTransferStore::new();
        let transfer = sample_transfer();
        let id = transfer.id.clone();
        store.create(transfer).await.unwrap();

        let decide = |_: &Transfer| TransferStatusUpdate {
            status: TransferStatus::PendingAnchor,
            ..Default::default()
        };
        store
            .complete_interactive(&id, "tok-1", Box::new(decide))
            .await
            .unwrap();

        let second = store
            .complete_interactive(&id, "tok-1", Box::new(decide))
            .await;
        assert!(matches!(second, Err(StorageError::TokenInvalid)));
    }

    #[tokio::test]
    async fn complete_interactive_rejects_mismatched_token() {
        let store = InMemoryTransferStore::new();
        let transfer = sample_transfer();
        let id = transfer.id.clone();
        store.create(transfer).await.unwrap();

        let result = store
            .complete_interactive(
                &id,
                "wrong-token",
                Box::new(|_: &Transfer| TransferStatusUpdate::default()),
            )
            .await;
        assert!(matches!(result, Err(StorageError::TokenInvalid)));
    }

    #[tokio::test]
    async fn list_by_account_filters_and_sorts() {
        let store = InMemoryTransferStore::new();
        let mut older = sample_transfer();
        older.created_at = Utc::now() - chrono::Duration::hours(2);
        let newer = sample_transfer();

        store.create(older.clone()).await.unwrap();
        store.create(newer.clone()).await.unwrap();

        let results = store
            .list_by_account("GACCOUNT", &TransferListFilter::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, newer.id);
    }

    /// `spec.md` §3 invariant I4: `completed_at` is set exactly when status
    /// is terminal — reverting to a non-terminal status must clear it.
    #[tokio::test]
    async fn update_clears_completed_at_on_non_terminal_status() {
        let store = InMemoryTransferStore::new();
        let transfer = sample_transfer();
        let id = transfer.id.clone();
        store.create(transfer).await.unwrap();

        let completed = store
            .update(
                &id,
                TransferStatusUpdate {
                    status: TransferStatus::Completed,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());

        let reverted = store
            .update(
                &id,
                TransferStatusUpdate {
                    status: TransferStatus::PendingAnchor,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reverted.completed_at.is_none());
    }
}
