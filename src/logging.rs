//! Run log plumbing.
//!
//! Every run log line is emitted as a `tracing` event and, when one is
//! attached, passed to the caller's [`LogCallback`]. The subscriber helpers
//! ([`init`], [`init_test`]) need the `logging` feature.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Severity of a run log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Callback type for receiving run log lines.
///
/// # Example
///
/// ```rust
/// use chunkpack::logging::{LogCallback, LogLevel};
/// use std::sync::Arc;
///
/// let logger: LogCallback = Arc::new(|level: LogLevel, message: &str| {
///     if level >= LogLevel::Warn {
///         eprintln!("[{level}] {message}");
///     }
/// });
/// logger(LogLevel::Error, "chunk missing");
/// ```
pub type LogCallback = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Sends `message` to `tracing` and to `callback`, if any.
pub fn emit(level: LogLevel, message: &str, callback: Option<&LogCallback>) {
    match level {
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Error => tracing::error!("{message}"),
    }
    if let Some(callback) = callback {
        callback(level, message);
    }
}

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` if a
/// global subscriber was already set.
#[cfg(feature = "logging")]
pub fn init(default_filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Initialize logging for tests (captured by the test harness)
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_reaches_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: LogCallback = Arc::new(move |level: LogLevel, message: &str| {
            sink.lock().unwrap().push((level, message.to_string()));
        });

        emit(LogLevel::Info, "hello", Some(&callback));
        emit(LogLevel::Error, "boom", Some(&callback));
        emit(LogLevel::Warn, "nobody listening", None);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (LogLevel::Info, "hello".to_string()),
                (LogLevel::Error, "boom".to_string())
            ]
        );
    }

    #[test]
    fn test_level_order_and_display() {
        assert!(LogLevel::Debug < LogLevel::Error);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(serde_json::to_string(&LogLevel::Info).unwrap(), "\"info\"");
    }

    #[cfg(feature = "logging")]
    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        assert!(!init("info"));
    }
}
