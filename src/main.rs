//! Micro-frontend layout server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ layout::matcher (redirect?)
//!                          │
//!                          ▼
//!                   streaming::renderer ──▶ http::upstream ──▶ application,
//!                          │                                   fragment and
//!                          ▼                                   prop upstreams
//!     ◀────────────── streaming::merge (document order)
//!
//!     config::watcher ──▶ layout::resolver ──▶ ArcSwap<ResolvedDocument>
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use spa_layout::config::{load_config, ServerConfig};
use spa_layout::lifecycle::{signals, startup, Shutdown};
use spa_layout::observability::logging;

#[derive(Parser)]
#[command(name = "spa-layout", about = "Streaming micro-frontend layout server")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    let directives = format!("spa_layout={},tower_http=info", config.observability.log_level);
    if let Err(e) = logging::init_tracing(&directives) {
        eprintln!("Failed to initialize logging: {e}");
    }

    tracing::info!("spa-layout v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        layout = %config.layout.path,
        applications = config.applications.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    match startup::run(config, shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
