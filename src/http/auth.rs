//! SEP-10 HTTP surface (`spec.md` §4.2, §6.1): `GET /auth` issues a
//! challenge, `POST /auth` verifies one and returns a bearer token. `POST
//! /auth` accepts either a JSON or a form-urlencoded body, matching
//! wallets that still submit the challenge the older SEP-10 way.

use axum::extract::FromRequest;
use axum::http::header::CONTENT_TYPE;
use axum::{extract::Query, extract::Request, extract::State, Json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::api_error::ApiError;
use crate::service::{auth_service, ServiceContainer};

/// Accepts `application/json` or `application/x-www-form-urlencoded`,
/// dispatching on the request's `Content-Type` header.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + 'static,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let axum::Form(value) = axum::Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            Ok(JsonOrForm(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            Ok(JsonOrForm(value))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    account: String,
    home_domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    transaction: String,
    network_passphrase: String,
}

pub async fn get_challenge(
    State(services): State<Arc<ServiceContainer>>,
    Query(query): Query<ChallengeQuery>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let challenge = auth_service::create_challenge(&services, &query.account, query.home_domain.as_deref())
        .await
        .map_err(map_auth_error)?;

    Ok(Json(ChallengeResponse {
        transaction: challenge.transaction_xdr,
        network_passphrase: challenge.network_passphrase,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    transaction: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    token: String,
}

pub async fn verify_challenge(
    State(services): State<Arc<ServiceContainer>>,
    JsonOrForm(request): JsonOrForm<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let token = auth_service::verify_challenge(&services, &request.transaction)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(VerifyResponse { token }))
}

/// `spec.md` §4.2 "Failure semantics": a missing/expired/consumed nonce is
/// `invalid_challenge`, same as any other structural challenge defect —
/// distinguishable in the message, not the machine code.
fn map_auth_error(error: auth_service::AuthServiceError) -> ApiError {
    use crate::challenge::ChallengeError;
    use crate::horizon::HorizonError;
    use auth_service::AuthServiceError;
    match error {
        AuthServiceError::InvalidAccount => ApiError::bad_request(error.to_string()),
        // Insufficient client signature weight is its own bucket per
        // `spec.md` §4.2 "Failure semantics": `unauthorized`, not
        // `invalid_challenge` — the challenge itself was well-formed, the
        // signer just didn't clear the threshold.
        AuthServiceError::Challenge(ChallengeError::InsufficientWeight { .. }) => {
            ApiError::unauthorized(error.to_string())
        }
        AuthServiceError::Challenge(_) | AuthServiceError::NonceReplayed => {
            ApiError::with_code(axum::http::StatusCode::BAD_REQUEST, "invalid_challenge", error.to_string())
        }
        AuthServiceError::Horizon(HorizonError::Request(ref reqwest_err)) if reqwest_err.is_timeout() => {
            ApiError::Opaque {
                message: "account lookup timed out".to_string(),
                code: "invalid_challenge".to_string(),
                status: axum::http::StatusCode::BAD_REQUEST,
                details: std::collections::HashMap::from([(
                    "retryable".to_string(),
                    serde_json::json!(true),
                )]),
            }
        }
        AuthServiceError::Horizon(_) => ApiError::Internal(anyhow::anyhow!(error)),
        AuthServiceError::Token(_) => ApiError::Internal(anyhow::anyhow!(error)),
    }
}
