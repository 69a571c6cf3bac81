//! Transfer engine (`spec.md` §4.3): initiation of interactive and
//! programmatic deposits/withdrawals, and the status transitions an
//! operator or the interactive-complete callback drives afterwards.

use chrono::{Duration, Utc};
use rand::RngCore;

use crate::models::{
    AssetConfig, InteractiveToken, OperationProfile, Transfer, TransferKind, TransferListFilter,
    TransferMode, TransferStatus, TransferStatusUpdate,
};
use crate::storage::StorageError;

use super::ServiceContainer;

/// `spec.md` §4.3, "Identifier and URL construction".
const TRANSFER_ID_BYTES: usize = 16;
const INTERACTIVE_TOKEN_BYTES: usize = 32;
const INTERACTIVE_TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum TransferServiceError {
    #[error("Asset {0} not supported by anchor")]
    UnknownAsset(String),
    #[error("{0} is not enabled for this asset")]
    OperationDisabled(&'static str),
    #[error("destination is required for a withdrawal")]
    MissingDestination,
    #[error("withdrawal type is required")]
    MissingWithdrawType,
    #[error("amount {amount} is outside the configured range [{min:?}, {max:?}]")]
    AmountOutOfRange {
        amount: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct InitiateRequest {
    pub kind: TransferKind,
    pub mode: TransferMode,
    pub account: String,
    pub asset_code: String,
    pub amount: Option<f64>,
    pub destination: Option<String>,
    pub destination_extra: Option<String>,
    pub memo: Option<String>,
    pub memo_type: Option<String>,
}

/// Case-insensitive lookup against the configured asset set (`spec.md`
/// §4.3, "Asset validation" — `usdc` must match configured `USDC`).
pub fn find_asset<'a>(services: &'a ServiceContainer, code: &str) -> Option<&'a AssetConfig> {
    services
        .config
        .assets
        .values()
        .find(|asset| asset.code.eq_ignore_ascii_case(code))
}

/// Validate `request` against the asset's configured operation profile
/// and persist a new transfer in its initial state.
pub async fn initiate(
    services: &ServiceContainer,
    request: InitiateRequest,
) -> Result<Transfer, TransferServiceError> {
    let asset = find_asset(services, &request.asset_code)
        .ok_or_else(|| TransferServiceError::UnknownAsset(request.asset_code.clone()))?
        .clone();

    let profile = match request.kind {
        TransferKind::Deposit => &asset.deposit,
        TransferKind::Withdrawal => &asset.withdraw,
    };
    check_profile(profile, request.kind)?;

    if request.kind == TransferKind::Withdrawal && request.destination.is_none() {
        return Err(TransferServiceError::MissingDestination);
    }

    if let Some(amount) = request.amount {
        check_amount(profile, amount)?;
    }

    let now = Utc::now();
    let id = generate_hex_id(TRANSFER_ID_BYTES);

    let interactive_token = match request.mode {
        TransferMode::Interactive => Some(InteractiveToken {
            value: generate_hex_id(INTERACTIVE_TOKEN_BYTES),
            created_at: now,
            expires_at: now + Duration::minutes(INTERACTIVE_TOKEN_TTL_MINUTES),
            consumed: false,
        }),
        TransferMode::Programmatic => None,
    };

    let interactive_url = match (&interactive_token, &services.config.sep24) {
        (Some(token), Some(sep24)) => Some(build_interactive_url(
            &sep24.interactive_url,
            &id,
            &token.value,
        )),
        _ => None,
    };

    let more_info_url = format!(
        "{}://{}/transaction/more_info?id={}",
        services.config.url_scheme(),
        services.config.domain,
        id
    );

    let transfer = Transfer {
        id,
        kind: request.kind,
        mode: request.mode,
        status: TransferStatus::Incomplete,
        asset_code: asset.code.clone(),
        asset_issuer: asset.issuer.clone(),
        account: request.account,
        amount: request.amount,
        destination: request.destination,
        destination_extra: request.destination_extra,
        memo: request.memo,
        memo_type: request.memo_type,
        interactive_token,
        interactive_url,
        more_info_url,
        stellar_transaction_id: None,
        external_transaction_id: None,
        status_message: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
        metadata: Default::default(),
    };

    let created = services.transfers.create(transfer).await?;
    Ok(created)
}

fn check_profile(
    profile: &OperationProfile,
    kind: TransferKind,
) -> Result<(), TransferServiceError> {
    if !profile.enabled {
        let label = match kind {
            TransferKind::Deposit => "deposit",
            TransferKind::Withdrawal => "withdraw",
        };
        return Err(TransferServiceError::OperationDisabled(label));
    }
    Ok(())
}

fn check_amount(profile: &OperationProfile, amount: f64) -> Result<(), TransferServiceError> {
    let below_min = profile.min_amount.map_or(false, |min| amount < min);
    let above_max = profile.max_amount.map_or(false, |max| amount > max);
    if below_min || above_max {
        return Err(TransferServiceError::AmountOutOfRange {
            amount,
            min: profile.min_amount,
            max: profile.max_amount,
        });
    }
    Ok(())
}

/// `<base>?transaction_id=<id>&token=<token>`, percent-encoded per
/// `spec.md` §4.3.
fn build_interactive_url(base: &str, transaction_id: &str, token: &str) -> String {
    match url::Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("transaction_id", transaction_id)
                .append_pair("token", token);
            url.to_string()
        }
        Err(_) => format!("{base}?transaction_id={transaction_id}&token={token}"),
    }
}

pub async fn get_by_id(
    services: &ServiceContainer,
    id: &str,
) -> Result<Transfer, TransferServiceError> {
    Ok(services.transfers.get_by_id(id).await?)
}

pub async fn get_by_on_chain_id(
    services: &ServiceContainer,
    stellar_transaction_id: &str,
) -> Result<Transfer, TransferServiceError> {
    Ok(services
        .transfers
        .get_by_on_chain_id(stellar_transaction_id)
        .await?)
}

pub async fn get_by_external_id(
    services: &ServiceContainer,
    external_transaction_id: &str,
) -> Result<Transfer, TransferServiceError> {
    Ok(services
        .transfers
        .get_by_external_id(external_transaction_id)
        .await?)
}

pub async fn list_by_account(
    services: &ServiceContainer,
    account: &str,
    filter: TransferListFilter,
) -> Result<Vec<Transfer>, TransferServiceError> {
    Ok(services.transfers.list_by_account(account, &filter).await?)
}

/// Consume the interactive token bound to `(id, token)` and advance the
/// transfer's status, per `spec.md` §4.3 "Completion rule (interactive)":
/// deposits in `Incomplete` move to `PendingUserTransferStart`, withdrawals
/// in `Incomplete` move to `PendingAnchor`, and completion on any other
/// starting status is a no-op to status but still consumes the token.
pub async fn complete_interactive(
    services: &ServiceContainer,
    id: &str,
    token: &str,
) -> Result<Transfer, TransferServiceError> {
    let decide = |current: &Transfer| {
        let status = if current.status == TransferStatus::Incomplete {
            match current.kind {
                TransferKind::Deposit => TransferStatus::PendingUserTransferStart,
                TransferKind::Withdrawal => TransferStatus::PendingAnchor,
            }
        } else {
            current.status
        };
        TransferStatusUpdate {
            status,
            ..Default::default()
        }
    };

    Ok(services
        .transfers
        .complete_interactive(id, token, Box::new(decide))
        .await?)
}

pub async fn update_status(
    services: &ServiceContainer,
    id: &str,
    update: TransferStatusUpdate,
) -> Result<Transfer, TransferServiceError> {
    Ok(services.transfers.update(id, update).await?)
}

/// `bytes` random octets, hex-encoded — used for both the transfer id and
/// the interactive token value (`spec.md` §4.3).
fn generate_hex_id(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_id_is_32_hex_chars() {
        let id = generate_hex_id(TRANSFER_ID_BYTES);
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn interactive_token_is_64_hex_chars() {
        let token = generate_hex_id(INTERACTIVE_TOKEN_BYTES);
        assert_eq!(token.len(), 64);
    }

    #[test]
    fn interactive_url_carries_both_params() {
        let url = build_interactive_url("https://kyc.example.com/start", "abc123", "tok-xyz");
        assert!(url.contains("transaction_id=abc123"));
        assert!(url.contains("token=tok-xyz"));
    }
}
