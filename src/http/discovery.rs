//! `GET /.well-known/stellar.toml` (`spec.md` §4.1, §6.1). Unauthenticated,
//! served as `text/plain` per SEP-1.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::service::ServiceContainer;

pub async fn stellar_toml(State(services): State<Arc<ServiceContainer>>) -> Response {
    let body = services.discovery_document().await.to_string();
    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
