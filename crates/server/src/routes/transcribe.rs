// crates/server/src/routes/transcribe.rs
//! Job submission endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use podscribe_core::is_safe_url;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct TranscribeResponse {
    pub job_id: String,
}

/// POST /transcribe — validate the URL and dispatch a background job.
///
/// Returns 202 with the job id immediately; pipeline outcomes are only
/// visible through the progress stream, never through this response.
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranscribeRequest>,
) -> ApiResult<(StatusCode, Json<TranscribeResponse>)> {
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing 'url' field".to_string()))?;

    if !is_safe_url(url) {
        return Err(ApiError::BadRequest(
            "URL must be a well-formed http(s) address".to_string(),
        ));
    }

    let job_id = state
        .dispatcher
        .submit(url)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(TranscribeResponse { job_id })))
}

/// Create the transcribe routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/transcribe", post(submit_job))
}
