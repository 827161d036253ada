//! DOM reconciliation subsystem (client side).
//!
//! # Data Flow
//! ```text
//! Orchestration runtime lifecycle events
//!     → engine.rs (LayoutEngine::handle)
//!         before-routing       → redirect decision
//!         before-mount-routing → reconcile(resolved tree, URL, live DOM)
//!         app unmounted        → remove that container
//!         app error            → mount error display
//!     → Dom capability (insert / move / remove, never recreate containers)
//!
//! First activation over server markup:
//!     hydrate.rs adopts existing nodes before any mutation
//! ```
//!
//! # Design Decisions
//! - The live DOM is reached only through the [`Dom`] capability trait
//! - Node associations live in a side table owned by the engine, keeping the
//!   resolved tree immutable
//! - Insert only when a node is not already in its target position

pub mod engine;
pub mod hydrate;
pub mod memory;

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::layout::error::ConfigurationError;

pub use engine::{EngineOptions, EventOutcome, LayoutEngine, LifecycleEvent};
pub use memory::{DomOp, MemoryDom};

/// Kind of a live DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

/// What a live node looks like, for hydration matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShape {
    pub kind: NodeKind,
    /// Lower-cased tag name; empty for text and comments.
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Character data of text and comment nodes.
    pub text: String,
}

impl NodeShape {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_blank_text(&self) -> bool {
        self.kind == NodeKind::Text && self.text.trim().is_empty()
    }
}

/// The few DOM primitives the engine needs.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    fn create_element(&mut self, tag: &str) -> Self::Node;
    fn create_text(&mut self, value: &str) -> Self::Node;
    fn create_comment(&mut self, value: &str) -> Self::Node;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn shape(&self, node: &Self::Node) -> NodeShape;
    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Insert `node` into `parent` before `reference`, or last when `None`.
    /// Moves the node if it is already attached elsewhere.
    fn insert_before(&mut self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);
    fn remove(&mut self, node: &Self::Node);

    /// Attached element with the given id.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// Container lookup: `#id` or a tag name.
    fn query(&self, selector: &str) -> Option<Self::Node>;

    fn current_url(&self) -> Url;

    /// Text of a data script element, e.g. the server's layout data island.
    fn script_data(&self, id: &str) -> Option<String> {
        let script = self.element_by_id(id)?;
        let text = self.first_child(&script)?;
        Some(self.shape(&text).text)
    }
}

/// The micro-frontend orchestration runtime, as seen by the engine.
pub trait Orchestrator {
    /// Applications the runtime considers active for `url`.
    fn check_active_names(&self, url: &Url) -> Vec<String>;
    /// Applications currently mounted.
    fn mounted_names(&self) -> Vec<String>;
}

/// An application failed after mounting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("application `{app_name}` failed: {message}")]
pub struct RuntimeAppError {
    pub app_name: String,
    pub message: String,
}

/// Errors surfaced by the engine to its host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Application(#[from] RuntimeAppError),
}
