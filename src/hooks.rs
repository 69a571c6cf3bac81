//! Operator hook interfaces (`spec.md` §6.4). The SEP-24 and SEP-6 mounts
//! are reached through a small set of trait objects rather than framework
//! middleware closures, the same composition-root shape `ServiceContainer`
//! uses for its other collaborators. A hook is "effectively untrusted"
//! (`spec.md` §9): it returns `Result<Option<_>, ApiError>` so a structured
//! failure (`ApiError`) passes straight through to the client, and the
//! default implementations supply the fallback behavior `spec.md` §6.4
//! describes when no hook is configured.

use async_trait::async_trait;
use rand::Rng;

use crate::api_error::ApiError;
use crate::models::Transfer;

/// Fields an `onDeposit`/`onWithdraw` hook may override on the SEP-24
/// initiation response. `None` leaves the engine's default in place.
#[derive(Debug, Default, Clone)]
pub struct Sep24InitiateOverride {
    pub url: Option<String>,
}

#[async_trait]
pub trait Sep24Hooks: Send + Sync {
    async fn on_deposit(&self, _transfer: &Transfer) -> Result<Option<Sep24InitiateOverride>, ApiError> {
        Ok(None)
    }

    async fn on_withdraw(&self, _transfer: &Transfer) -> Result<Option<Sep24InitiateOverride>, ApiError> {
        Ok(None)
    }

    /// Invoked after the engine has already advanced the transfer's status
    /// for a completed interactive session. A hook error here does not
    /// undo the status transition — it only affects the response to the
    /// operator page.
    async fn on_interactive_complete(&self, _transfer: &Transfer) -> Result<(), ApiError> {
        Ok(())
    }

    /// Render the `GET /transaction/more_info` body. The default is the
    /// minimal id/status/kind page `spec.md` §6.1 describes.
    async fn render_more_info(&self, transfer: &Transfer) -> Result<String, ApiError> {
        Ok(default_more_info_page(transfer))
    }
}

/// Fields an `onDeposit`/`onWithdraw` hook may override on the SEP-6
/// programmatic response.
#[derive(Debug, Default, Clone)]
pub struct Sep6DepositOverride {
    pub how: Option<String>,
    pub extra_info: Option<serde_json::Value>,
}

#[derive(Debug, Default, Clone)]
pub struct Sep6WithdrawOverride {
    pub account_id: Option<String>,
    pub memo: Option<String>,
    pub memo_type: Option<String>,
}

#[async_trait]
pub trait Sep6Hooks: Send + Sync {
    async fn on_deposit(&self, _transfer: &Transfer) -> Result<Option<Sep6DepositOverride>, ApiError> {
        Ok(None)
    }

    async fn on_withdraw(&self, _transfer: &Transfer) -> Result<Option<Sep6WithdrawOverride>, ApiError> {
        Ok(None)
    }
}

/// No-op `Sep24Hooks` producing the defaults `spec.md` §6.4 calls for when
/// the operator configures no hooks at all.
pub struct DefaultSep24Hooks;

#[async_trait]
impl Sep24Hooks for DefaultSep24Hooks {}

/// No-op `Sep6Hooks`. Default messages are filled in by
/// `default_deposit_how`/`default_withdraw_memo` at the call site, since
/// they need the signing account and asset code the hook trait doesn't
/// carry.
pub struct DefaultSep6Hooks;

#[async_trait]
impl Sep6Hooks for DefaultSep6Hooks {}

/// "send `<asset>` to `<signing account>`…" — the SEP-6 deposit default
/// instruction when no `onDeposit` hook is configured.
pub fn default_deposit_how(asset_code: &str, signing_account: &str) -> String {
    format!("send {asset_code} to {signing_account} via the issuing bank's transfer system")
}

/// A random numeric memo of type `id` — the SEP-6 withdraw default when no
/// `onWithdraw` hook is configured.
pub fn default_withdraw_memo() -> (String, &'static str) {
    let memo: u64 = rand::thread_rng().gen_range(1..=u64::MAX / 2);
    (memo.to_string(), "id")
}

fn default_more_info_page(transfer: &Transfer) -> String {
    format!(
        "<html><body><h1>Transaction {id}</h1><p>Kind: {kind:?}</p><p>Status: {status:?}</p></body></html>",
        id = transfer.id,
        kind = transfer.kind,
        status = transfer.status,
    )
}
