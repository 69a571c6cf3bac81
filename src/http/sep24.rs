//! SEP-24 hosted/interactive transfer surface (`spec.md` §4.5, §6.1). Every
//! route but `/sep24/info` and the interactive redirect sits behind the
//! bearer-token guard; `/interactive` and `/interactive/complete` and
//! `/transaction/more_info` are top-level routes reached by the operator's
//! page rather than the wallet client, so they carry no bearer token.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::map_transfer_error;
use crate::api_error::ApiError;
use crate::middleware::auth::AuthenticatedAccount;
use crate::models::{RequiredField, Transfer, TransferKind, TransferListFilter, TransferMode, TransferStatus};
use crate::service::{transfer_service, ServiceContainer};

#[derive(Debug, Serialize)]
pub struct Sep24InfoResponse {
    deposit: HashMap<String, AssetOperationInfo>,
    withdraw: HashMap<String, AssetOperationInfo>,
    fee: FeeInfo,
}

#[derive(Debug, Serialize)]
pub struct FeeInfo {
    enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct AssetOperationInfo {
    enabled: bool,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fee_fixed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fee_percent: Option<f64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    fields: HashMap<String, RequiredField>,
}

pub async fn info(State(services): State<Arc<ServiceContainer>>) -> Json<Sep24InfoResponse> {
    let mut deposit = HashMap::new();
    let mut withdraw = HashMap::new();

    for asset in services.config.assets.values() {
        deposit.insert(asset.code.clone(), profile_info(&asset.deposit));
        withdraw.insert(asset.code.clone(), profile_info(&asset.withdraw));
    }

    Json(Sep24InfoResponse {
        deposit,
        withdraw,
        fee: FeeInfo { enabled: false },
    })
}

fn profile_info(profile: &crate::models::OperationProfile) -> AssetOperationInfo {
    AssetOperationInfo {
        enabled: profile.enabled,
        min_amount: profile.min_amount,
        max_amount: profile.max_amount,
        fee_fixed: profile.fee_fixed,
        fee_percent: profile.fee_percent,
        fields: profile.fields.clone(),
    }
}

#[derive(Debug, Deserialize)]
pub struct InteractiveRequest {
    asset_code: String,
    amount: Option<f64>,
    /// Accepted and validated as a well-formed Stellar address, but the
    /// bearer-token subject always wins when both are present
    /// (`spec.md` §4.5).
    account: Option<String>,
    memo: Option<String>,
    memo_type: Option<String>,
    #[serde(rename = "dest")]
    destination: Option<String>,
    #[serde(rename = "dest_extra")]
    destination_extra: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InteractiveResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    url: String,
    id: String,
}

pub async fn deposit_interactive(
    State(services): State<Arc<ServiceContainer>>,
    authenticated: AuthenticatedAccount,
    Json(request): Json<InteractiveRequest>,
) -> Result<Json<InteractiveResponse>, ApiError> {
    start_interactive(services, authenticated, TransferKind::Deposit, request).await
}

pub async fn withdraw_interactive(
    State(services): State<Arc<ServiceContainer>>,
    authenticated: AuthenticatedAccount,
    Json(request): Json<InteractiveRequest>,
) -> Result<Json<InteractiveResponse>, ApiError> {
    start_interactive(services, authenticated, TransferKind::Withdrawal, request).await
}

/// If `account` is supplied it must be a well-formed Stellar address, but
/// the bearer-token subject is always the transfer owner when both are
/// present (`spec.md` §4.5).
fn resolve_owner(authenticated: &AuthenticatedAccount, supplied: Option<&str>) -> Result<String, ApiError> {
    if let Some(account) = supplied {
        stellar_base::crypto::KeyPair::from_public_key(account)
            .map_err(|_| ApiError::bad_request("account is not a well-formed Stellar address"))?;
    }
    Ok(authenticated.account.clone())
}

async fn start_interactive(
    services: Arc<ServiceContainer>,
    authenticated: AuthenticatedAccount,
    kind: TransferKind,
    request: InteractiveRequest,
) -> Result<Json<InteractiveResponse>, ApiError> {
    let account = resolve_owner(&authenticated, request.account.as_deref())?;

    let transfer = transfer_service::initiate(
        &services,
        transfer_service::InitiateRequest {
            kind,
            mode: TransferMode::Interactive,
            account,
            asset_code: request.asset_code,
            amount: request.amount,
            destination: request.destination,
            destination_extra: request.destination_extra,
            memo: request.memo,
            memo_type: request.memo_type,
        },
    )
    .await
    .map_err(map_transfer_error)?;

    let hook_result = match kind {
        TransferKind::Deposit => services.sep24_hooks.on_deposit(&transfer).await?,
        TransferKind::Withdrawal => services.sep24_hooks.on_withdraw(&transfer).await?,
    };
    let url = hook_result
        .and_then(|override_| override_.url)
        .unwrap_or_else(|| transfer.interactive_url.clone().unwrap_or_default());

    Ok(Json(InteractiveResponse {
        kind: "interactive_customer_info_needed",
        url,
        id: transfer.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    id: Option<String>,
    stellar_transaction_id: Option<String>,
    external_transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionEnvelope {
    transaction: TransactionView,
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    id: String,
    kind: TransferKind,
    status: TransferStatus,
    status_eta: Option<u32>,
    amount_in: Option<f64>,
    more_info_url: String,
    stellar_transaction_id: Option<String>,
    external_transaction_id: Option<String>,
}

impl From<Transfer> for TransactionView {
    fn from(t: Transfer) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            status: t.status,
            status_eta: t.status_eta(),
            amount_in: t.amount,
            more_info_url: t.more_info_url,
            stellar_transaction_id: t.stellar_transaction_id,
            external_transaction_id: t.external_transaction_id,
        }
    }
}

pub async fn get_transaction(
    State(services): State<Arc<ServiceContainer>>,
    _authenticated: AuthenticatedAccount,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionEnvelope>, ApiError> {
    let transfer = if let Some(id) = query.id {
        transfer_service::get_by_id(&services, &id).await
    } else if let Some(stellar_id) = query.stellar_transaction_id {
        transfer_service::get_by_on_chain_id(&services, &stellar_id).await
    } else if let Some(external_id) = query.external_transaction_id {
        transfer_service::get_by_external_id(&services, &external_id).await
    } else {
        return Err(ApiError::bad_request(
            "one of id, stellar_transaction_id, external_transaction_id is required",
        ));
    }
    .map_err(map_transfer_error)?;

    Ok(Json(TransactionEnvelope {
        transaction: transfer.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    asset_code: Option<String>,
    kind: Option<TransferKind>,
    no_older_than: Option<chrono::DateTime<chrono::Utc>>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsEnvelope {
    transactions: Vec<TransactionView>,
}

/// `limit=0` or negative is ignored — `list_by_account` then returns
/// everything (`spec.md` §8, boundary behaviors).
pub async fn get_transactions(
    State(services): State<Arc<ServiceContainer>>,
    authenticated: AuthenticatedAccount,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsEnvelope>, ApiError> {
    let filter = TransferListFilter {
        asset_code: query.asset_code,
        kind: query.kind,
        not_older_than: query.no_older_than,
        limit: query.limit.filter(|l| *l > 0),
    };

    let transfers = transfer_service::list_by_account(&services, &authenticated.account, filter)
        .await
        .map_err(map_transfer_error)?;

    Ok(Json(TransactionsEnvelope {
        transactions: transfers.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct InteractiveRedirectQuery {
    token: String,
    transaction_id: String,
}

/// `GET /interactive` is unauthenticated by design — the token in the URL
/// is the credential, consumed by `POST /interactive/complete`, not here.
/// `token` and `transaction_id` are forwarded to the operator's page
/// exactly as received; rewriting either would break the completion
/// contract (`spec.md` §9, "Redirect endpoint"). Built by hand rather than
/// `axum::response::Redirect` (which only offers 307/308/303): `spec.md`
/// §6.1 and the happy-deposit scenario both require a 302.
pub async fn interactive_redirect(
    State(services): State<Arc<ServiceContainer>>,
    Query(query): Query<InteractiveRedirectQuery>,
) -> Result<Response, ApiError> {
    let base = services
        .config
        .sep24
        .as_ref()
        .ok_or_else(|| ApiError::not_found("SEP-24 is not mounted"))?;

    let mut url = url::Url::parse(&base.interactive_url)
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("invalid interactive_url configured")))?;
    url.query_pairs_mut()
        .append_pair("transaction_id", &query.transaction_id)
        .append_pair("token", &query.token);

    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}

#[derive(Debug, Deserialize)]
pub struct InteractiveCompleteRequest {
    transaction_id: String,
    token: String,
}

/// Called by the operator's interactive page when the user finishes
/// supplying KYC/bank details, per `spec.md` §4.3 "Completion rule
/// (interactive)". Consumes the token exactly once.
pub async fn interactive_complete(
    State(services): State<Arc<ServiceContainer>>,
    Json(request): Json<InteractiveCompleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = transfer_service::complete_interactive(
        &services,
        &request.transaction_id,
        &request.token,
    )
    .await
    .map_err(map_transfer_error)?;

    services.sep24_hooks.on_interactive_complete(&transfer).await?;

    Ok(Json(json!({
        "success": true,
        "status": transfer.status,
        "message": "transfer updated",
    })))
}

#[derive(Debug, Deserialize)]
pub struct MoreInfoQuery {
    id: String,
}

/// `GET /transaction/more_info` always succeeds with either the
/// operator's `renderMoreInfo` hook output or the minimal default page
/// (`spec.md` §4.5, §7 "no HTML error pages... this page always
/// succeeds").
pub async fn transaction_more_info(
    State(services): State<Arc<ServiceContainer>>,
    Query(query): Query<MoreInfoQuery>,
) -> impl IntoResponse {
    let body = match transfer_service::get_by_id(&services, &query.id).await {
        Ok(transfer) => match services.sep24_hooks.render_more_info(&transfer).await {
            Ok(html) => html,
            Err(_) => format!("<html><body><h1>Transaction {}</h1></body></html>", transfer.id),
        },
        Err(_) => "<html><body><p>Transaction not found.</p></body></html>".to_string(),
    };

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
}

