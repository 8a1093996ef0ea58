// src/api/mod.rs — Health-check HTTP endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SERVICE_NAME: &str = "review-eval";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: f64,
}

pub fn health_status(started_at: DateTime<Utc>) -> HealthStatus {
    let now = Utc::now();
    HealthStatus {
        status: "healthy",
        timestamp: now.to_rfc3339(),
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: (now - started_at).num_milliseconds().max(0) as f64 / 1000.0,
    }
}

async fn health(State(started_at): State<DateTime<Utc>>) -> Json<HealthStatus> {
    Json(health_status(started_at))
}

/// `/health` and `/` both report service health.
pub fn build_router(started_at: DateTime<Utc>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(health))
        .with_state(started_at)
}

/// Serve until the process is terminated.
pub async fn start_server(port: u16) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let router = build_router(Utc::now());

    tracing::info!("Health server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
