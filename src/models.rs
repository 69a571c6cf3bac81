//! Domain types shared across the discovery, auth and transfer-engine
//! services: asset capabilities, the transfer entity and its lifecycle
//! enums, and the SEP-10 nonce/interactive-token value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of an asset as published in the discovery document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Live,
    Test,
    Dead,
    Private,
}

/// A single required-field entry for deposit/withdraw (SEP-6/24 `fields`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredField {
    pub description: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

/// Fee and limit configuration shared by the deposit and withdraw profiles
/// of an asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationProfile {
    pub enabled: bool,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub fee_fixed: Option<f64>,
    pub fee_percent: Option<f64>,
    #[serde(default)]
    pub fields: HashMap<String, RequiredField>,
}

/// Operator-configured capability for a single asset code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub code: String,
    pub issuer: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u8,
    pub status: Option<AssetStatus>,
    #[serde(default)]
    pub deposit: OperationProfile,
    #[serde(default)]
    pub withdraw: OperationProfile,
}

fn default_display_decimals() -> u8 {
    7
}

impl AssetConfig {
    pub fn is_native(&self) -> bool {
        self.code.eq_ignore_ascii_case("native") || self.code.eq_ignore_ascii_case("XLM")
    }
}

/// Whether a transfer moves funds into or out of the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Deposit,
    Withdrawal,
}

/// Whether a transfer was initiated through the SEP-24 interactive flow or
/// the SEP-6 programmatic flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Interactive,
    Programmatic,
}

/// Transfer status, per `spec.md` §4.3. `Incomplete` collapses the source
/// system's `INITIATING`/`INTERACTIVE` distinction into a single initial
/// state — see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    #[default]
    Incomplete,
    PendingUserTransferStart,
    PendingAnchor,
    PendingExternal,
    PendingUser,
    Completed,
    Error,
    Refunded,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Error | TransferStatus::Refunded
        )
    }

    /// `status_eta` is fixed at 3 for the initial status and undefined
    /// (omitted) otherwise — P7 in `spec.md` §8.
    pub fn status_eta(self) -> Option<u32> {
        match self {
            TransferStatus::Incomplete => Some(3),
            _ => None,
        }
    }
}

/// A single-use token binding the operator's interactive page back to a
/// transfer. Present iff the transfer is interactive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveToken {
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl InteractiveToken {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && self.expires_at > now
    }
}

/// The central transfer record. See `spec.md` §3 for field semantics and
/// invariants I1–I6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub kind: TransferKind,
    pub mode: TransferMode,
    pub status: TransferStatus,
    pub asset_code: String,
    pub asset_issuer: Option<String>,
    pub account: String,
    pub amount: Option<f64>,
    pub destination: Option<String>,
    pub destination_extra: Option<String>,
    pub memo: Option<String>,
    pub memo_type: Option<String>,
    pub interactive_token: Option<InteractiveToken>,
    pub interactive_url: Option<String>,
    pub more_info_url: String,
    pub stellar_transaction_id: Option<String>,
    pub external_transaction_id: Option<String>,
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Transfer {
    pub fn status_eta(&self) -> Option<u32> {
        self.status.status_eta()
    }
}

/// Filters accepted by `list_by_account` (`spec.md` §4.4).
#[derive(Debug, Clone, Default)]
pub struct TransferListFilter {
    pub asset_code: Option<String>,
    pub kind: Option<TransferKind>,
    pub not_older_than: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// Fields an operator-side status update may carry alongside the new
/// `status` (`spec.md` §4.3, "Update status").
#[derive(Debug, Clone, Default)]
pub struct TransferStatusUpdate {
    pub status: TransferStatus,
    pub stellar_transaction_id: Option<String>,
    pub external_transaction_id: Option<String>,
    pub status_message: Option<String>,
    pub amount: Option<f64>,
}
