//! Axum Handlers for the HTTP API
//!
//! The service exposes a single JSON endpoint besides the WebSocket: a health
//! check reporting how many sessions are connected.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = 2)]
    pub active_sessions: usize,
    /// RFC 3339 time at which the check ran.
    #[schema(example = "2025-01-01T12:00:00.000Z")]
    pub timestamp: String,
}

/// Report service health and the number of connected sessions.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_sessions: state.registry.count().await,
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}
