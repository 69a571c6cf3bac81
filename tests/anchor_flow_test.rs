//! End-to-end HTTP tests against the assembled router, in the teacher's
//! own style (`tower::util::ServiceExt::oneshot`, JSON request/response
//! helpers). Bearer tokens are minted directly with `auth::mint_token`
//! rather than walking the full SEP-10 challenge exchange, since the
//! challenge/verify cryptography is covered separately in
//! `src/challenge.rs`'s own unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use anchor_server::app::create_app_with_services;
use anchor_server::auth;
use anchor_server::config::{Config, JwtConfig, MountConfig, Network, Sep24Config, ServerConfigOrDefault, TelemetryConfig};
use anchor_server::models::{AssetConfig, OperationProfile};
use anchor_server::service::ServiceContainer;

const OPERATOR_SECRET: &str = "SCZ47IF6SNCYNCNK3QDNO663UFFUGQN4RI2V2RR7SCSR4VC53CPVYDRT";
const JWT_SECRET: &str = "test-jwt-secret-at-least-32-bytes-long!!";
const TEST_ACCOUNT: &str = "GAGMKXQBMOBFA36KUJFFBMY4UBOWLEUPVRCKQ6UIG2THNVA6RECIKUIM";

fn usdc_asset() -> AssetConfig {
    AssetConfig {
        code: "USDC".to_string(),
        issuer: Some("GISSUERISSUERISSUERISSUERISSUERISSUERISSUERISSUERISS".to_string()),
        display_name: Some("USD Coin".to_string()),
        description: None,
        display_decimals: 2,
        status: None,
        deposit: OperationProfile {
            enabled: true,
            min_amount: Some(1.0),
            max_amount: Some(10_000.0),
            fee_fixed: Some(0.0),
            fee_percent: None,
            fields: HashMap::new(),
        },
        withdraw: OperationProfile {
            enabled: true,
            min_amount: Some(1.0),
            max_amount: Some(10_000.0),
            fee_fixed: Some(0.0),
            fee_percent: None,
            fields: HashMap::new(),
        },
    }
}

fn test_config() -> Config {
    let mut assets = HashMap::new();
    assets.insert("USDC".to_string(), usdc_asset());

    Config {
        domain: "anchor.example.com".to_string(),
        secret_key: OPERATOR_SECRET.to_string(),
        network: Network::Testnet,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_hours: 24,
        },
        assets,
        meta: None,
        server: ServerConfigOrDefault::default(),
        mounts: MountConfig::default(),
        sep24: Some(Sep24Config {
            interactive_url: "https://kyc.example.com/start".to_string(),
        }),
        telemetry: TelemetryConfig::default(),
        horizon_url: None,
    }
}

fn test_app() -> (Router, Arc<ServiceContainer>) {
    let services = Arc::new(ServiceContainer::new(test_config()));
    (create_app_with_services(services.clone()), services)
}

fn bearer_token(services: &ServiceContainer, account: &str) -> String {
    auth::mint_token(
        &services.config.domain,
        account,
        &services.config.jwt.secret,
        services.config.jwt.expiration_hours,
    )
    .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn parse_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!({}))
}

#[tokio::test]
async fn discovery_document_lists_mounted_endpoints() {
    let (app, _services) = test_app();

    let response = app
        .oneshot(get("/.well-known/stellar.toml", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let toml = String::from_utf8(body.to_vec()).unwrap();

    assert!(toml.contains("WEB_AUTH_ENDPOINT"));
    assert!(toml.contains("TRANSFER_SERVER_SEP0024"));
    assert!(toml.contains("TRANSFER_SERVER ="));
    assert!(toml.contains("code = \"USDC\""));
}

#[tokio::test]
async fn discovery_document_omits_disabled_mounts() {
    let mut config = test_config();
    config.mounts = MountConfig {
        sep10: false,
        sep24: false,
        sep6: true,
    };
    config.sep24 = None;
    let services = Arc::new(ServiceContainer::new(config));
    let app = create_app_with_services(services);

    let response = app
        .oneshot(get("/.well-known/stellar.toml", None))
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let toml = String::from_utf8(body.to_vec()).unwrap();

    assert!(!toml.contains("WEB_AUTH_ENDPOINT"));
    assert!(!toml.contains("TRANSFER_SERVER_SEP0024"));
    assert!(toml.contains("TRANSFER_SERVER ="));
}

#[tokio::test]
async fn sep24_deposit_interactive_requires_bearer_token() {
    let (app, _services) = test_app();

    let response = app
        .oneshot(json_post(
            "/sep24/transactions/deposit/interactive",
            None,
            json!({ "asset_code": "USDC" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // `spec.md` §7: every response, including auth failures, carries the
    // structured `{error, code}` envelope rather than an empty body.
    let body = parse_response(response).await;
    assert_eq!(body["code"], "unauthorized");
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn sep24_deposit_interactive_rejects_unknown_asset() {
    let (app, services) = test_app();
    let token = bearer_token(&services, TEST_ACCOUNT);

    let response = app
        .oneshot(json_post(
            "/sep24/transactions/deposit/interactive",
            Some(&token),
            json!({ "asset_code": "FAKE" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response(response).await;
    assert!(body["error"].as_str().unwrap().contains("FAKE"));
}

#[tokio::test]
async fn sep24_full_interactive_deposit_flow() {
    let (app, services) = test_app();
    let token = bearer_token(&services, TEST_ACCOUNT);

    let response = app
        .clone()
        .oneshot(json_post(
            "/sep24/transactions/deposit/interactive",
            Some(&token),
            json!({ "asset_code": "usdc", "amount": 50.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;

    let transaction_id = body["id"].as_str().unwrap().to_string();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.contains("transaction_id="));
    assert!(url.contains("token="));

    let parsed = url::Url::parse(&url).unwrap();
    let query: HashMap<_, _> = parsed.query_pairs().into_owned().collect();
    let interactive_token = query.get("token").unwrap().clone();

    // Before completion, the wallet polls and sees the initial status.
    let response = app
        .clone()
        .oneshot(get(
            &format!("/sep24/transaction?id={transaction_id}"),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;
    assert_eq!(body["transaction"]["status"], "incomplete");

    // The operator's page posts completion back.
    let response = app
        .clone()
        .oneshot(json_post(
            "/interactive/complete",
            None,
            json!({ "transaction_id": transaction_id, "token": interactive_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending_user_transfer_start");

    // Status moved forward for subsequent polls too.
    let response = app
        .clone()
        .oneshot(get(
            &format!("/sep24/transaction?id={transaction_id}"),
            Some(&token),
        ))
        .await
        .unwrap();
    let body = parse_response(response).await;
    assert_eq!(body["transaction"]["status"], "pending_user_transfer_start");

    // The token is single-use.
    let response = app
        .oneshot(json_post(
            "/interactive/complete",
            None,
            json!({ "transaction_id": transaction_id, "token": interactive_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sep24_transactions_list_filters_by_asset_and_kind() {
    let (app, services) = test_app();
    let token = bearer_token(&services, TEST_ACCOUNT);

    for _ in 0..2 {
        app.clone()
            .oneshot(json_post(
                "/sep24/transactions/deposit/interactive",
                Some(&token),
                json!({ "asset_code": "USDC" }),
            ))
            .await
            .unwrap();
    }

    let response = app
        .oneshot(get(
            "/sep24/transactions?asset_code=USDC&kind=deposit",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
}

#[tokio::test]
async fn sep6_withdraw_requires_destination_and_type() {
    let (app, services) = test_app();
    let token = bearer_token(&services, TEST_ACCOUNT);

    let response = app
        .oneshot(get(
            "/sep6/withdraw?asset_code=USDC&type=bank_account",
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response(response).await;
    assert!(body["error"].as_str().unwrap().contains("destination"));
}

#[tokio::test]
async fn sep6_withdraw_succeeds_with_destination() {
    let (app, services) = test_app();
    let token = bearer_token(&services, TEST_ACCOUNT);

    let response = app
        .oneshot(get(
            &format!("/sep6/withdraw?asset_code=USDC&type=bank_account&dest={TEST_ACCOUNT}"),
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;
    assert!(body["id"].as_str().is_some());
    assert_eq!(body["memo_type"], "id");
}

#[tokio::test]
async fn sep6_info_is_unauthenticated() {
    let (app, _services) = test_app();

    let response = app.oneshot(get("/sep6/info", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;
    assert_eq!(body["authentication_required"], true);
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let (app, _services) = test_app();

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response(response).await;
    assert_eq!(body["status"], "healthy");
}
