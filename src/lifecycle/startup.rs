//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the layout named by the configuration
//! - Start background tasks (layout watcher, metrics)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, except a watcher that cannot
//!   start, which only disables hot reload
//! - Listeners start last (traffic only when ready)

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::net::TcpListener;
use url::Url;

use crate::config::{load_layout, ConfigError, LayoutWatcher, ServerConfig};
use crate::http::{AppState, HttpServer, UpstreamCollaborators};
use crate::layout::model::ResolvedDocument;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::streaming::collaborators::RenderCollaborators;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid layout origin: {0}")]
    Origin(#[from] url::ParseError),

    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Handler state for a layout and a set of collaborators.
pub fn app_state(
    config: &ServerConfig,
    layout: Arc<ArcSwap<ResolvedDocument>>,
    collaborators: Arc<dyn RenderCollaborators>,
) -> Result<AppState, StartupError> {
    Ok(AppState {
        layout,
        collaborators,
        namespace: Arc::from(config.layout.namespace.as_str()),
        origin: Url::parse(&config.layout.origin)?,
    })
}

/// Run the layout server described by `config` until `shutdown` fires.
pub async fn run(config: ServerConfig, shutdown: Arc<Shutdown>) -> Result<(), StartupError> {
    let layout_path = PathBuf::from(&config.layout.path);
    let document = load_layout(&layout_path, config.layout.strict)?;
    let layout = Arc::new(ArcSwap::from_pointee(document));

    // Dropping the watcher stops it, so it lives as long as the server.
    let _watcher = if config.layout.watch {
        match LayoutWatcher::new(&layout_path, config.layout.strict, layout.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Layout watcher failed to start; hot reload disabled");
                None
            }
        }
    } else {
        None
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let collaborators = Arc::new(UpstreamCollaborators::from_config(&config));
    let state = app_state(&config, layout, collaborators)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(&config, state)
        .run(listener, shutdown.subscribe())
        .await?;
    Ok(())
}
