//! Structured logging setup for autodeps
//!
//! Logs always go to stderr so that documents printed to stdout stay clean.
//! `RUST_LOG`, when set, takes precedence over the configured level.
//!
//! # Example
//!
//! ```no_run
//! use autodeps::util::logging::{init_logging, LoggingConfig};
//! use tracing::{info, warn, Level};
//!
//! init_logging(LoggingConfig::from_env(Level::DEBUG));
//! info!("Resolving build log");
//! warn!(count = 3, "Objects unused");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Level,

    /// One JSON object per event instead of plain lines
    pub use_json: bool,

    /// Prefix each event with its module path (e.g., autodeps::tree::arena)
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::with_level(Level::INFO)
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            use_json: false,
            include_target: false,
        }
    }

    /// `level`, with JSON output if `AUTODEPS_LOG_JSON` is `true`
    pub fn from_env(level: Level) -> Self {
        let use_json = env::var("AUTODEPS_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);
        Self {
            use_json,
            // Module paths help more than they clutter once debugging
            include_target: level >= Level::DEBUG,
            ..Self::with_level(level)
        }
    }
}

/// Parses a level name, case-insensitively
///
/// ```
/// use autodeps::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("WARN"), Some(Level::WARN));
/// assert_eq!(parse_level("loud"), None);
/// ```
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Picks the level from command-line flags, then `fallback`.
///
/// An explicit `--log-level` wins over `-v`, which wins over `-q`. Names
/// that do not parse fall back to INFO with a note on stderr, since the
/// subscriber is not up yet.
pub fn resolve_level(log_level: Option<&str>, verbose: bool, quiet: bool, fallback: &str) -> Level {
    let name = match (log_level, verbose, quiet) {
        (Some(name), _, _) => name,
        (None, true, _) => return Level::DEBUG,
        (None, false, true) => return Level::ERROR,
        (None, false, false) => fallback,
    };
    parse_level(name).unwrap_or_else(|| {
        eprintln!(
            "Invalid log level '{}', using info (expected trace, debug, info, warn or error)",
            name
        );
        Level::INFO
    })
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if env::var_os("RUST_LOG").is_none() {
            if let Ok(directive) = format!("autodeps={}", config.level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        let plain = (!config.use_json).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
        });
        let json = config.use_json.then(|| {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(plain)
            .with(json)
            .init();
    });
}
