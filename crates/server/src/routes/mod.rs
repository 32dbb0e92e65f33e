// crates/server/src/routes/mod.rs
//! API route handlers for the podscribe server.

pub mod health;
pub mod progress;
pub mod transcribe;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router.
///
/// Routes:
/// - POST /transcribe - Submit a media URL, get a job id back
/// - GET /progress/{job_id} - SSE stream of job progress snapshots
/// - GET /health - Health check
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(transcribe::router())
        .merge(progress::router())
        .with_state(state)
}
