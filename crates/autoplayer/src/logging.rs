use std::env;
use std::path::PathBuf;

use tracing::{warn, Level};
use tracing_appender::rolling;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::default_data_dir;
use crate::errors::AutoplayerError;

const LOG_FILE_NAME: &str = "nq2-autoplayer.log";

/// Map a level name to a tracing level, defaulting to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Log directory: `NQ2_LOG_DIR` if set, otherwise under the local data dir.
pub fn log_dir() -> PathBuf {
    env::var("NQ2_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir().join("logs"))
}

/// Filter for both log layers. Non-empty `RUST_LOG` directives win outright;
/// otherwise `level` applies with the DevTools socket and HTTP client
/// chatter held at warn.
pub fn build_filter(rust_log: Option<&str>, level: Level) -> EnvFilter {
    if let Some(directives) = rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid RUST_LOG '{directives}': {e}"),
        }
    }

    let level_filter = LevelFilter::from_level(level);
    ["tungstenite=warn", "hyper=warn", "reqwest=warn"]
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(EnvFilter::new(level_filter.to_string()), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Install stderr and daily-rolling file logging.
///
/// `level` comes from the CLI; `LOG_LEVEL` is consulted when it is absent.
/// `RUST_LOG` overrides both. Returns the log directory.
pub fn init_logging(level: Option<&str>) -> Result<PathBuf, AutoplayerError> {
    let log_level = level
        .map(parse_level)
        .or_else(|| env::var("LOG_LEVEL").ok().map(|l| parse_level(&l)))
        .unwrap_or(Level::INFO);

    let log_dir = log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {e}", log_dir.display());
    }
    let file_appender = rolling::daily(&log_dir, LOG_FILE_NAME);

    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = || build_filter(rust_log.as_deref(), log_level);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(filter()),
        )
        .try_init()
        .map_err(|e| AutoplayerError::Config(format!("Logging already initialized: {e}")))?;

    if log_level > Level::INFO {
        warn!("Verbose logging enabled ({log_level})");
    }
    Ok(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_rust_log_overrides_level() {
        let filter = build_filter(Some("debug"), Level::INFO).to_string();
        assert!(filter.contains("debug"));
        assert!(!filter.contains("info"));
        assert!(!filter.contains("tungstenite"));
    }

    #[test]
    fn test_level_applies_without_rust_log() {
        for rust_log in [None, Some(""), Some("   ")] {
            let filter = build_filter(rust_log, Level::WARN).to_string();
            assert!(filter.contains("warn"));
            assert!(filter.contains("tungstenite=warn"));
            assert!(!filter.contains("debug"));
        }
    }
}
