// crates/server/src/routes/health.rs
//! Health check endpoint for monitoring.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Response for the health check endpoint.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub whisper_model: String,
    pub timestamp: String,
    pub uptime_secs: u64,
}

/// GET /health - Health check endpoint.
///
/// Static readiness info only; nothing about individual jobs.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.model_loaded,
        whisper_model: state.config.whisper_model.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            model_loaded: true,
            whisper_model: "base".to_string(),
            timestamp: "2026-08-06T12:00:00Z".to_string(),
            uptime_secs: 42,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"model_loaded\":true"));
        assert!(json.contains("\"whisper_model\":\"base\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }
}
