// crates/server/src/routes/progress.rs
//! Job progress streaming endpoint.
//!
//! `GET /progress/{job_id}` — SSE stream of job snapshots. Each event is one
//! JSON object; consecutive events always differ in `(status, progress)`.
//! The terminal event carries the full `result` or `error`, and the stream
//! closes right after it. An unknown id yields a single not-found event.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;

use crate::jobs::JobSnapshot;
use crate::state::AppState;

/// GET /progress/{job_id} — SSE stream of snapshots until terminal.
pub async fn job_progress(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.store.subscribe(&job_id);

    let stream = async_stream::stream! {
        let mut rx = match subscription {
            Some(rx) => rx,
            None => {
                tracing::debug!(%job_id, "progress stream for unknown job");
                let data = serde_json::json!({ "error": "job not found" });
                yield Ok(Event::default().data(data.to_string()));
                return;
            }
        };

        // Always deliver the state visible at stream start; streams begin
        // from current state, not history.
        let snapshot = rx.borrow_and_update().clone();
        let mut last_emitted = (snapshot.status, snapshot.progress);
        let terminal = snapshot.status.is_terminal();
        yield Ok(snapshot_event(&snapshot));
        if terminal {
            return;
        }

        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.status.is_terminal() {
                // Exactly one terminal event, then the stream ends.
                yield Ok(snapshot_event(&snapshot));
                return;
            }
            let key = (snapshot.status, snapshot.progress);
            if key != last_emitted {
                last_emitted = key;
                yield Ok(snapshot_event(&snapshot));
            }
        }
        // Channel closed (job evicted mid-stream): end silently.
    };

    Sse::new(stream)
}

fn snapshot_event(snapshot: &JobSnapshot) -> Event {
    Event::default().data(serde_json::to_string(snapshot).unwrap_or_default())
}

/// Create the progress routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/progress/{job_id}", get(job_progress))
}
