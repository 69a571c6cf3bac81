//! SEP-6 programmatic transfer surface (`spec.md` §4.5, §6.1). Both
//! `/sep6/deposit` and `/sep6/withdraw` sit behind the bearer-token guard;
//! `/sep6/info` does not, but still advertises `authentication_required`
//! so clients know every other SEP-6 route needs a token.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api_error::ApiError;
use crate::hooks::{default_deposit_how, default_withdraw_memo};
use crate::middleware::auth::AuthenticatedAccount;
use crate::models::{RequiredField, TransferKind, TransferMode};
use crate::service::{transfer_service, ServiceContainer};

#[derive(Debug, Serialize)]
pub struct Sep6InfoResponse {
    deposit: HashMap<String, Sep6OperationInfo>,
    withdraw: HashMap<String, Sep6OperationInfo>,
    fee: Sep6FeeInfo,
    authentication_required: bool,
}

#[derive(Debug, Serialize)]
pub struct Sep6FeeInfo {
    enabled: bool,
    authentication_required: bool,
}

#[derive(Debug, Serialize)]
pub struct Sep6OperationInfo {
    enabled: bool,
    authentication_required: bool,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fee_fixed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fee_percent: Option<f64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    fields: HashMap<String, RequiredField>,
}

pub async fn info(State(services): State<Arc<ServiceContainer>>) -> Json<Sep6InfoResponse> {
    let mut deposit = HashMap::new();
    let mut withdraw = HashMap::new();

    for asset in services.config.assets.values() {
        deposit.insert(asset.code.clone(), profile_info(&asset.deposit));
        withdraw.insert(asset.code.clone(), profile_info(&asset.withdraw));
    }

    Json(Sep6InfoResponse {
        deposit,
        withdraw,
        fee: Sep6FeeInfo {
            enabled: false,
            authentication_required: true,
        },
        authentication_required: true,
    })
}

fn profile_info(profile: &crate::models::OperationProfile) -> Sep6OperationInfo {
    Sep6OperationInfo {
        enabled: profile.enabled,
        authentication_required: true,
        min_amount: profile.min_amount,
        max_amount: profile.max_amount,
        fee_fixed: profile.fee_fixed,
        fee_percent: profile.fee_percent,
        fields: profile.fields.clone(),
    }
}

#[derive(Debug, Deserialize)]
pub struct DepositQuery {
    asset_code: String,
    account: Option<String>,
    memo_type: Option<String>,
    memo: Option<String>,
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    how: String,
    id: String,
    eta: u32,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    fee_fixed: Option<f64>,
    fee_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_info: Option<Value>,
}

/// `spec.md` §6.1: `GET /sep6/deposit` — the account field, if supplied,
/// must match a well-formed Stellar address, but the bearer-token subject
/// is always the transfer owner (`spec.md` §4.5).
pub async fn deposit(
    State(services): State<Arc<ServiceContainer>>,
    authenticated: AuthenticatedAccount,
    Query(query): Query<DepositQuery>,
) -> Result<Json<DepositResponse>, ApiError> {
    if let Some(account) = &query.account {
        stellar_base::crypto::KeyPair::from_public_key(account)
            .map_err(|_| ApiError::bad_request("account is not a well-formed Stellar address"))?;
    }

    let asset = transfer_service::find_asset(&services, &query.asset_code)
        .ok_or_else(|| ApiError::bad_request(format!("Asset {} not supported by anchor", query.asset_code)))?
        .clone();

    let transfer = transfer_service::initiate(
        &services,
        transfer_service::InitiateRequest {
            kind: TransferKind::Deposit,
            mode: TransferMode::Programmatic,
            account: authenticated.account,
            asset_code: query.asset_code,
            amount: query.amount,
            destination: None,
            destination_extra: None,
            memo: query.memo,
            memo_type: query.memo_type,
        },
    )
    .await
    .map_err(super::map_transfer_error)?;

    let override_ = services.sep6_hooks.on_deposit(&transfer).await?;
    let signing_account = services.signing_keypair().public_key().account_id();
    let how = override_
        .as_ref()
        .and_then(|o| o.how.clone())
        .unwrap_or_else(|| default_deposit_how(&asset.code, &signing_account));
    let extra_info = override_.and_then(|o| o.extra_info);

    Ok(Json(DepositResponse {
        how,
        id: transfer.id,
        eta: 60,
        min_amount: asset.deposit.min_amount,
        max_amount: asset.deposit.max_amount,
        fee_fixed: asset.deposit.fee_fixed,
        fee_percent: asset.deposit.fee_percent,
        extra_info,
    }))
}

#[derive(Debug, Deserialize)]
pub struct WithdrawQuery {
    asset_code: String,
    #[serde(rename = "type")]
    withdraw_type: Option<String>,
    dest: Option<String>,
    dest_extra: Option<String>,
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    account_id: String,
    memo_type: String,
    memo: String,
    id: String,
    eta: u32,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    fee_fixed: Option<f64>,
    fee_percent: Option<f64>,
}

/// `spec.md` §6.1: `GET /sep6/withdraw` — `type` is required (`spec.md`
/// §4.3 table). `dest` is required and never silently defaulted to the
/// caller's own address (`spec.md` §9, open question decision).
pub async fn withdraw(
    State(services): State<Arc<ServiceContainer>>,
    authenticated: AuthenticatedAccount,
    Query(query): Query<WithdrawQuery>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    if query.withdraw_type.is_none() {
        return Err(ApiError::bad_request("withdrawal type is required"));
    }
    let destination = query
        .dest
        .ok_or_else(|| ApiError::bad_request("destination is required for a withdrawal"))?;

    let asset = transfer_service::find_asset(&services, &query.asset_code)
        .ok_or_else(|| ApiError::bad_request(format!("Asset {} not supported by anchor", query.asset_code)))?
        .clone();

    let transfer = transfer_service::initiate(
        &services,
        transfer_service::InitiateRequest {
            kind: TransferKind::Withdrawal,
            mode: TransferMode::Programmatic,
            account: authenticated.account,
            asset_code: query.asset_code,
            amount: query.amount,
            destination: Some(destination),
            destination_extra: query.dest_extra,
            memo: None,
            memo_type: None,
        },
    )
    .await
    .map_err(super::map_transfer_error)?;

    let override_ = services.sep6_hooks.on_withdraw(&transfer).await?;
    let (default_memo, default_memo_type) = default_withdraw_memo();

    Ok(Json(WithdrawResponse {
        account_id: override_
            .as_ref()
            .and_then(|o| o.account_id.clone())
            .unwrap_or_else(|| services.signing_keypair().public_key().account_id()),
        memo_type: override_
            .as_ref()
            .and_then(|o| o.memo_type.clone())
            .unwrap_or_else(|| default_memo_type.to_string()),
        memo: override_
            .and_then(|o| o.memo)
            .unwrap_or(default_memo),
        id: transfer.id,
        eta: 300,
        min_amount: asset.withdraw.min_amount,
        max_amount: asset.withdraw.max_amount,
        fee_fixed: asset.withdraw.fee_fixed,
        fee_percent: asset.withdraw.fee_percent,
    }))
}
