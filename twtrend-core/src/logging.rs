//! Tracing subscriber setup shared by the binaries.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Append to a file; keeps a full-screen terminal clean.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub target: LogTarget,
}

impl LoggingConfig {
    /// Level from `RUST_LOG` (default `info`), logging to stderr.
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            target: LogTarget::Stderr,
        }
    }

    /// Like [`from_env`](Self::from_env) but writes to `TWTREND_LOG_FILE`,
    /// falling back to `default_file`.
    pub fn file_from_env(default_file: PathBuf) -> Self {
        let path = std::env::var_os("TWTREND_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or(default_file);
        Self {
            target: LogTarget::File(path),
            ..Self::from_env()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("install subscriber: {0}")]
    Install(String),
}

pub fn init_logging(config: LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogTarget::File(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LoggingError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .try_init()
        }
    }
    .map_err(|e| LoggingError::Install(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(path: PathBuf) -> LoggingConfig {
        LoggingConfig {
            log_level: "debug".into(),
            target: LogTarget::File(path),
        }
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("twtrend.log");
        match init_logging(file_config(path.clone())) {
            Err(LoggingError::OpenFile { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected OpenFile, got {other:?}"),
        }
    }

    #[test]
    fn file_target_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twtrend.log");
        init_logging(file_config(path.clone())).unwrap();
        assert!(path.exists());

        let again = init_logging(file_config(path));
        assert!(matches!(again, Err(LoggingError::Install(_))));
    }
}
