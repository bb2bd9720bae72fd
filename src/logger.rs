//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the effective log level is resolved.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initialise the global tracing subscriber, writing to stderr.
///
/// `level` accepts standard level strings (`"error"` … `"trace"`) or any
/// `EnvFilter` directive such as `"relay_bot=debug,reqwest=warn"`. It is
/// already resolved from `-v`, `RELAY_LOG_LEVEL` and the config file, so
/// `RUST_LOG` is not consulted.
pub fn init(level: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Map a `-v` count to a log level. `0` means "use the configured level".
///
///   -v      → warn
///   -vv     → info
///   -vvv    → debug
///   -vvvv+  → trace
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_tiers() {
        assert_eq!(level_for_verbosity(0), None);
        assert_eq!(level_for_verbosity(1), Some("warn"));
        assert_eq!(level_for_verbosity(3), Some("debug"));
        assert_eq!(level_for_verbosity(9), Some("trace"));
    }

    #[test]
    fn init_info_succeeds_or_already_init() {
        // May already be set by a prior test in the same process; both outcomes are fine.
        match init("info") {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn init_rejects_bad_directive() {
        let err = init("relay_bot=loud").unwrap_err();
        assert!(matches!(err, AppError::Logger(ref m) if m.contains("invalid log level")));
    }
}
