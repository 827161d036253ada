//! Structured logging.
//!
//! # Design Decisions
//! - Uses the `tracing` crate for structured events
//! - Level filtering comes from `RUST_LOG`, falling back to directives
//!   built from the configured log level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
pub fn init_tracing(default_directives: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
