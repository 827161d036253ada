//! Layout subsystem: the shared route tree.
//!
//! # Data Flow
//! ```text
//! InputNode tree (from an external markup parser) + LayoutData
//!     → resolver.rs (validate, compose paths, build activation predicates)
//!     → ResolvedRoutes / ResolvedDocument (immutable, shared via Arc)
//!
//! Per navigation (client) or per request (server):
//!     ResolvedRoutes + URL
//!     → matcher.rs (drop inactive routes)
//!     → matched tree consumed by streaming/ and dom/
//! ```
//!
//! # Design Decisions
//! - Resolution happens once per configuration load
//! - Activation predicates are computed at resolve time, never re-derived
//! - The model carries no environment-specific state

pub mod applications;
pub mod error;
pub mod input;
pub mod matcher;
pub mod model;
pub mod path;
pub mod resolver;

pub use applications::{construct_applications, LogicalApplication};
pub use error::{ActivationError, ConfigurationError};
pub use input::{Attribute, InputNode, LayoutData};
pub use matcher::{find_redirect, match_routes};
pub use model::{
    container_id, PropValue, ResolvedDocument, ResolvedNode, ResolvedRoutes, DATA_ISLAND_ID,
    DEFAULT_NAMESPACE,
};
pub use path::{resolve_path, ActiveWhen, RoutingMode};
pub use resolver::{resolve, resolve_document, ResolveOptions};
