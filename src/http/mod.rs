//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → layout handler
//!         redirect source → 302 with empty body
//!         otherwise       → renderer, headers awaited, body streamed
//!     → upstream.rs (application, fragment, header and prop upstreams)
//! ```

pub mod request;
pub mod server;
pub mod upstream;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use upstream::UpstreamCollaborators;
