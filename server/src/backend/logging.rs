//! Tracing subscriber setup.
//!
//! Log lines carry a target per channel: `app`, `database`, `auth`,
//! `frontend`, `mail` and `scheduler`. Filter them with `RUST_LOG`, e.g.
//! `RUST_LOG=info,database=debug`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,sqlx=warn,tower_http=info";

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
