use axum::Json;
use serde::Serialize;

/// Basic health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Liveness probe response for Kubernetes
#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// GET /health - Basic health check
///
/// Returns a simple health status indicating the service is running.
/// This endpoint is suitable for basic load balancer health checks.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health/live - Liveness probe
///
/// Returns a simple "alive" status. This endpoint should always return 200
/// as long as the process is running. Suitable for Kubernetes liveness probes.
pub async fn liveness_check() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
        timestamp: chrono::Utc::now(),
    })
}
