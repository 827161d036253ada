//! Streaming composition subsystem (server side).
//!
//! # Data Flow
//! ```text
//! ResolvedDocument + request URL
//!     → renderer.rs (walk in document order)
//!         → collaborators.rs (render app / fragment, headers, props)
//!         → props.rs (deferred props fetched once per request)
//!     → merge.rs (ordered merge: commit order = queue order)
//!     → ByteStream → HTTP response body
//! ```
//!
//! # Design Decisions
//! - Producers start during the walk; the merge only decides commit order
//! - No cancellation mid-stream: a response runs to completion or failure
//! - One broken node never breaks the rest of the document

pub mod collaborators;
pub mod error;
pub mod html;
pub mod merge;
pub mod props;
pub mod renderer;

pub use collaborators::{AppHeaders, ApplicationRender, PropMap, PropsFuture, RenderCollaborators};
pub use error::{MergeError, RenderError};
pub use merge::{ByteStream, OrderedMerge, Source};
pub use renderer::{render_document, RenderResult};
