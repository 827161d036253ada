//! Micro-frontend layout engine.
//!
//! Resolves a declarative route/application layout once, then serves it in
//! two ways: a streaming server renderer that composes application markup
//! in document order, and a client engine that keeps application
//! containers positioned in a live DOM across navigations.

pub mod config;
pub mod dom;
pub mod http;
pub mod layout;
pub mod lifecycle;
pub mod observability;
pub mod streaming;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
