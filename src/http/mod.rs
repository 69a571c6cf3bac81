//! HTTP surface (`spec.md` §4.5, §6.1): one module per mountable router
//! group, wired together in `crate::app`.

pub mod auth;
pub mod discovery;
pub mod health;
pub mod sep24;
pub mod sep6;

use crate::api_error::ApiError;
use crate::service::transfer_service::TransferServiceError;
use crate::storage::StorageError;

/// Shared `TransferServiceError` → `ApiError` mapping used by both the
/// SEP-24 and SEP-6 handlers (`spec.md` §7).
pub(crate) fn map_transfer_error(error: TransferServiceError) -> ApiError {
    match error {
        TransferServiceError::UnknownAsset(_) => ApiError::bad_request(error.to_string()),
        TransferServiceError::OperationDisabled(_) => ApiError::bad_request(error.to_string()),
        TransferServiceError::MissingDestination => ApiError::bad_request(error.to_string()),
        TransferServiceError::MissingWithdrawType => ApiError::bad_request(error.to_string()),
        TransferServiceError::AmountOutOfRange { .. } => ApiError::bad_request(error.to_string()),
        TransferServiceError::Storage(StorageError::NotFound) => {
            ApiError::not_found("transaction not found")
        }
        TransferServiceError::Storage(StorageError::TokenInvalid) => ApiError::with_code(
            axum::http::StatusCode::BAD_REQUEST,
            "token_invalid",
            "interactive token already used, expired, or does not match this transaction",
        ),
        TransferServiceError::Storage(StorageError::Backend(msg)) => {
            ApiError::Internal(anyhow::anyhow!(msg))
        }
    }
}
