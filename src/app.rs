//! Router assembly (`spec.md` §4.5, §6.1). Mirrors the teacher's
//! `create_app`: one `Router` per concern, merged and nested, bearer-token
//! guard applied only where the route table marks `(JWT)`, CORS wide open
//! (SEP-1 requires `stellar.toml` to be fetchable cross-origin).

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    http::{auth, discovery, health, sep24, sep6},
    middleware::auth as auth_middleware,
    service::ServiceContainer,
};

pub fn create_app(config: Config) -> Router {
    let services = Arc::new(ServiceContainer::new(config.clone()));
    create_app_with_services(services)
}

pub fn create_app_with_services(services: Arc<ServiceContainer>) -> Router {
    let config = &services.config;

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check));

    let discovery_routes =
        Router::new().route("/.well-known/stellar.toml", get(discovery::stellar_toml));

    let mut router = Router::new().merge(health_routes).merge(discovery_routes);

    if config.mounts.sep10 {
        let auth_routes = Router::new()
            .route("/auth", get(auth::get_challenge))
            .route("/auth", post(auth::verify_challenge));
        router = router.merge(auth_routes);
    }

    if config.mounts.sep24 {
        let sep24_public = Router::new()
            .route("/sep24/info", get(sep24::info))
            .route("/interactive", get(sep24::interactive_redirect))
            .route("/interactive/complete", post(sep24::interactive_complete))
            .route("/transaction/more_info", get(sep24::transaction_more_info));

        let sep24_protected = Router::new()
            .route("/sep24/transactions/deposit/interactive", post(sep24::deposit_interactive))
            .route("/sep24/transactions/withdraw/interactive", post(sep24::withdraw_interactive))
            .route("/sep24/transaction", get(sep24::get_transaction))
            .route("/sep24/transactions", get(sep24::get_transactions))
            .layer(middleware::from_fn_with_state(
                services.clone(),
                auth_middleware::require_bearer_token,
            ));

        router = router.merge(sep24_public).merge(sep24_protected);
    }

    if config.mounts.sep6 {
        let sep6_public = Router::new().route("/sep6/info", get(sep6::info));

        let sep6_protected = Router::new()
            .route("/sep6/deposit", get(sep6::deposit))
            .route("/sep6/withdraw", get(sep6::withdraw))
            .layer(middleware::from_fn_with_state(
                services.clone(),
                auth_middleware::require_bearer_token,
            ));

        router = router.merge(sep6_public).merge(sep6_protected);
    }

    router
        .with_state(services)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
