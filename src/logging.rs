use crate::config::Config;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

static DEBUG_PAYLOAD: AtomicBool = AtomicBool::new(false);

/// Installs the global `tracing` subscriber.
///
/// Logs go to `config.log_path` in append mode when set, else to stderr.
pub fn init(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter '{}'", config.log_filter))?;
    DEBUG_PAYLOAD.store(config.debug_payload, Ordering::Relaxed);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match &config.log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    // A subscriber installed earlier (tests, embedding apps) wins.
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

pub fn debug_payload_enabled() -> bool {
    DEBUG_PAYLOAD.load(Ordering::Relaxed)
}

/// Logs a persistence payload as pretty JSON when payload debugging is on.
pub fn emit_debug_payload(label: &str, payload: &impl Serialize) {
    if !debug_payload_enabled() {
        return;
    }
    let formatted = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(target: "chatline::payload", "{label}\n{formatted}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatline.log");
        let config = Config {
            log_path: Some(path.clone()),
            debug_payload: true,
            ..Config::default()
        };

        init(&config).unwrap();
        assert!(path.exists());
        assert!(debug_payload_enabled());
        emit_debug_payload("test payload", &serde_json::json!({"ok": true}));
    }

    #[test]
    fn test_init_rejects_invalid_filter() {
        let config = Config {
            log_filter: "chatline=loud".to_string(),
            ..Config::default()
        };
        assert!(init(&config).is_err());
    }
}
