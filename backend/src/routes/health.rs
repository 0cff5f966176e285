//! Health probes
//!
//! - /health - process is up
//! - /health/ready - database reachable
//! - /health/live - liveness, always OK while serving

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Probe response
#[derive(Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ProbeResponse {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: None,
        }
    }
}

pub async fn health_check() -> Json<ProbeResponse> {
    Json(ProbeResponse::new("healthy"))
}

/// 503 when the database cannot be reached
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ProbeResponse>, (StatusCode, Json<ProbeResponse>)> {
    match db::health_check(state.db()).await {
        Ok(()) => Ok(Json(ProbeResponse {
            database: Some("healthy".to_string()),
            ..ProbeResponse::new("ready")
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ProbeResponse {
                database: Some(format!("unhealthy: {}", e)),
                ..ProbeResponse::new("not_ready")
            }),
        )),
    }
}

pub async fn liveness_check() -> Json<ProbeResponse> {
    Json(ProbeResponse::new("alive"))
}
