//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "CHATLOG_LOG";
pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

/// Installs the global fmt subscriber. Filter directives come from
/// `CHATLOG_LOG` (e.g. `debug` or `session_store=info`); invalid or missing
/// values fall back to `warn`. A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
