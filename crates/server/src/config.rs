// crates/server/src/config.rs
//! Environment-driven configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default port for the server.
const DEFAULT_PORT: u16 = 5000;

/// Default staging directory for downloaded media.
const DEFAULT_MEDIA_DIR: &str = "temp_audio";

/// Default whisper model name.
const DEFAULT_MODEL: &str = "base";

/// Default retention window for terminal jobs.
const DEFAULT_JOB_TTL_SECS: u64 = 3600;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Staging directory for downloaded media files.
    pub media_dir: PathBuf,
    /// Model name surfaced by the health endpoint (e.g. "base").
    pub whisper_model: String,
    /// Model file handed to the transcription engine.
    pub model_path: PathBuf,
    pub whisper_bin: String,
    pub ytdlp_bin: String,
    /// How long terminal jobs stay queryable before eviction.
    pub job_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let port = get("PODSCRIBE_PORT")
            .or_else(|| get("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let whisper_model = get("WHISPER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model_path = get("WHISPER_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("models/ggml-{whisper_model}.bin")));

        Self {
            port,
            media_dir: get("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR)),
            whisper_model,
            model_path,
            whisper_bin: get("WHISPER_BIN").unwrap_or_else(|| "whisper-cli".to_string()),
            ytdlp_bin: get("YTDLP_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            job_ttl: Duration::from_secs(
                get("JOB_TTL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_JOB_TTL_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.media_dir, PathBuf::from("temp_audio"));
        assert_eq!(config.whisper_model, "base");
        assert_eq!(config.model_path, PathBuf::from("models/ggml-base.bin"));
        assert_eq!(config.job_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn podscribe_port_wins_over_port() {
        let config = Config::from_lookup(lookup(&[("PODSCRIBE_PORT", "8080"), ("PORT", "9090")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn model_path_follows_model_name() {
        let config = Config::from_lookup(lookup(&[("WHISPER_MODEL", "small")]));
        assert_eq!(config.whisper_model, "small");
        assert_eq!(config.model_path, PathBuf::from("models/ggml-small.bin"));
    }

    #[test]
    fn explicit_model_path_wins() {
        let config = Config::from_lookup(lookup(&[
            ("WHISPER_MODEL", "small"),
            ("WHISPER_MODEL_PATH", "/opt/models/custom.bin"),
        ]));
        assert_eq!(config.model_path, PathBuf::from("/opt/models/custom.bin"));
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let config =
            Config::from_lookup(lookup(&[("PORT", "not-a-port"), ("JOB_TTL_SECS", "soon")]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.job_ttl, Duration::from_secs(3600));
    }
}
