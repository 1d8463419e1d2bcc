//! Interaction logging handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use curriculum::InteractionRecord;
use curriculum::interaction::LogStats;

use crate::server::client::ClientInfo;
use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for `POST /log`.
#[derive(Debug, Deserialize)]
pub struct LogRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response after logging an interaction.
#[derive(Serialize)]
pub struct LogResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub log_id: String,
}

/// POST /log - Record a client-reported interaction.
pub async fn post_log(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<LogRequest>,
) -> Result<Json<LogResponse>, ApiError> {
    let endpoint = request.endpoint.unwrap_or_else(|| "unknown".to_string());
    let mut client = client;
    if request.user_id.is_some() {
        client.user_id = request.user_id;
    }

    let record = InteractionRecord::new(endpoint, request.query)
        .with_response(request.response, request.success);

    let ack = state
        .record(client.apply(record))
        .await
        .ok_or_else(|| ApiError::Internal("Failed to log interaction".to_string()))?;

    Ok(Json(LogResponse {
        status: "logged".to_string(),
        timestamp: ack.timestamp,
        message: "Interaction logged successfully".to_string(),
        log_id: ack.log_id,
    }))
}

/// GET /log/stats - Facts about the active log file.
pub async fn get_log_stats(State(state): State<AppState>) -> Json<LogStats> {
    Json(state.logger.stats())
}
