//! Bearer-token guard (`spec.md` §4.2.2): validates the `Authorization:
//! Bearer <jwt>` header and exposes the authenticated Stellar account to
//! handlers via an extractor, the same shape as the teacher's
//! `AuthenticatedUser` but keyed on a Stellar account instead of a user id.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{api_error::ApiError, auth, service::ServiceContainer};

#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: String,
}

/// Every rejection here goes through `ApiError` rather than a bare
/// `StatusCode` — `spec.md` §7 requires the structured JSON envelope on
/// every response, including auth failures, not just an empty 401 body.
pub async fn require_bearer_token(
    State(services): State<Arc<ServiceContainer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    let claims = auth::verify_token(token, &services.config.jwt.secret)
        .map_err(|_| ApiError::unauthorized("bearer token is invalid or expired"))?;

    req.extensions_mut().insert(AuthenticatedAccount {
        account: claims.sub,
    });
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAccount>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))
    }
}
