// crates/server/src/main.rs
//! Podscribe server binary.
//!
//! Loads configuration, probes the transcription engine once, then serves
//! the HTTP API. A background sweeper evicts terminal jobs past their
//! retention window.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use podscribe_core::{Transcriber, WhisperCliTranscriber, YtDlpFetcher};
use podscribe_server::{create_app, AppState, Config};

/// How often the retention sweeper checks for expired jobs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env();

    // Staging directory must exist before the first download lands in it.
    tokio::fs::create_dir_all(&config.media_dir).await?;

    let fetcher = Arc::new(YtDlpFetcher::new(config.ytdlp_bin.clone()));
    let transcriber = Arc::new(WhisperCliTranscriber::new(
        config.whisper_bin.clone(),
        config.model_path.clone(),
        config.whisper_model.clone(),
    ));

    tracing::info!(model = %config.whisper_model, "probing transcription engine");
    let model_loaded = match transcriber.health_check().await {
        Ok(()) => {
            tracing::info!("transcription engine ready");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "transcription engine not ready; jobs will fail until it is");
            false
        }
    };

    let state = AppState::new(config, fetcher, transcriber, model_loaded);

    // Evict terminal jobs past their retention window.
    let sweeper_store = Arc::clone(&state.store);
    let job_ttl = state.config.job_ttl;
    tokio::spawn(async move {
        let ttl = chrono::Duration::from_std(job_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(3600));
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = sweeper_store.evict_finished_before(chrono::Utc::now() - ttl);
            if evicted > 0 {
                tracing::info!(evicted, "evicted expired jobs");
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(port = state.config.port, "listening");

    axum::serve(listener, create_app(state)).await?;

    Ok(())
}
