//! Health check handler

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State};
use serde::Serialize;

use crate::gateway::types::ApiResponse;
use crate::node::Node;
use crate::process::Role;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    pub timestamp_ms: u64,
    pub role: &'static str,
    pub participant_id: String,
}

/// GET /health
pub async fn health_check<R: Role>(
    State(node): State<Node<R>>,
) -> Json<ApiResponse<HealthResponse>> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Json(ApiResponse::success(HealthResponse {
        timestamp_ms,
        role: R::SIDE.as_str(),
        participant_id: node.participant.participant_id.clone(),
    }))
}
