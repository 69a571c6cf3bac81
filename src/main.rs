use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use anchor_server::{app::create_app_with_services, config::Config, nonce, service::ServiceContainer, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    telemetry::init_tracing_with_config(telemetry::TelemetryConfig {
        json_format: config.telemetry.json_format,
        log_filter: config.telemetry.log_filter.clone(),
    })?;

    let port = config.server.port;
    let bind_address = config.server.bind_address.clone();
    let services = Arc::new(ServiceContainer::new(config));

    let sweeper_cancel = CancellationToken::new();
    nonce::spawn_sweeper(services.nonces.clone(), sweeper_cancel.clone());

    let app = create_app_with_services(services);

    let addr: SocketAddr = format!("{bind_address}:{port}").parse()?;
    info!("starting anchor server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper_cancel.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining in-flight requests");
}
