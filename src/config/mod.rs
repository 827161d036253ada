//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! layout file (JSON document + layout data)
//!     → loader.rs (load_layout: parse, then resolve)
//!     → Arc<ArcSwap<ResolvedDocument>> shared with request handlers
//!
//! On layout change:
//!     watcher.rs detects change
//!     → loader.rs re-resolves
//!     → atomic swap; in-flight requests keep the layout they started with
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A layout that fails to resolve never replaces a working one

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_layout, ConfigError};
pub use schema::{FragmentSource, LayoutConfig, LayoutFile, ListenerConfig, ServerConfig};
pub use watcher::LayoutWatcher;
