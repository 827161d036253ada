//! Resolved tree model.
//!
//! Nodes are immutable once resolved. Leaf payloads and branch metadata sit
//! behind `Arc`, so a matched tree shares them with the tree it was filtered
//! from and only allocates fresh `children` vectors.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::layout::input::{Attribute, InputNode};
use crate::layout::path::{ActiveWhen, RoutingMode};

/// Stable identity of a DOM-capable node within one resolved tree.
pub type NodeId = u32;

/// Default prefix of application container ids.
pub const DEFAULT_NAMESPACE: &str = "single-spa-application";

/// Id of the element holding the server-rendered layout data.
pub const DATA_ISLAND_ID: &str = "single-spa-layout-data";

/// Deterministic id of an application's container element.
pub fn container_id(namespace: &str, app_name: &str) -> String {
    format!("{namespace}:{app_name}")
}

/// A prop value bound at resolve time.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Value(serde_json::Value),
    /// Not available at resolve time; fetched once per request on the server.
    Deferred,
}

/// A micro-frontend application placement.
#[derive(Debug)]
pub struct Application {
    pub name: String,
    pub props: BTreeMap<String, PropValue>,
    pub loader: Option<Vec<InputNode>>,
    pub error_handler: Option<Vec<InputNode>>,
}

/// Metadata of a `route` branch.
#[derive(Debug)]
pub struct RouteData {
    /// Composed absolute path, absent for default routes.
    pub path: Option<String>,
    pub exact: bool,
    pub is_default: bool,
    pub active_when: ActiveWhen,
}

#[derive(Debug, Clone)]
pub struct RouteNode {
    pub data: Arc<RouteData>,
    pub children: Vec<ResolvedNode>,
}

/// Metadata of a passthrough element.
#[derive(Debug)]
pub struct ElementData {
    pub id: NodeId,
    pub tag: String,
    pub attrs: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub data: Arc<ElementData>,
    pub children: Vec<ResolvedNode>,
}

/// Payload of text and comment nodes.
#[derive(Debug)]
pub struct TextData {
    pub id: NodeId,
    pub value: String,
}

/// A named slot filled by the fragment collaborator.
#[derive(Debug)]
pub struct FragmentSlot {
    pub name: Option<String>,
}

/// A node of the resolved tree.
#[derive(Debug, Clone)]
pub enum ResolvedNode {
    Application(Arc<Application>),
    Route(RouteNode),
    Element(ElementNode),
    Text(Arc<TextData>),
    Comment(Arc<TextData>),
    Doctype(Arc<str>),
    Fragment(Arc<FragmentSlot>),
    Assets,
    RouterContent,
}

impl ResolvedNode {
    pub fn children(&self) -> &[ResolvedNode] {
        match self {
            ResolvedNode::Route(r) => &r.children,
            ResolvedNode::Element(e) => &e.children,
            _ => &[],
        }
    }

    /// Depth-first pre-order visit.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a ResolvedNode)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Whether two nodes share the same underlying objects.
    pub fn same_as(&self, other: &ResolvedNode) -> bool {
        let same_self = match (self, other) {
            (ResolvedNode::Application(a), ResolvedNode::Application(b)) => Arc::ptr_eq(a, b),
            (ResolvedNode::Route(a), ResolvedNode::Route(b)) => Arc::ptr_eq(&a.data, &b.data),
            (ResolvedNode::Element(a), ResolvedNode::Element(b)) => Arc::ptr_eq(&a.data, &b.data),
            (ResolvedNode::Text(a), ResolvedNode::Text(b))
            | (ResolvedNode::Comment(a), ResolvedNode::Comment(b)) => Arc::ptr_eq(a, b),
            (ResolvedNode::Doctype(a), ResolvedNode::Doctype(b)) => Arc::ptr_eq(a, b),
            (ResolvedNode::Fragment(a), ResolvedNode::Fragment(b)) => Arc::ptr_eq(a, b),
            (ResolvedNode::Assets, ResolvedNode::Assets)
            | (ResolvedNode::RouterContent, ResolvedNode::RouterContent) => true,
            _ => false,
        };
        same_self
            && self.children().len() == other.children().len()
            && self.children().iter().zip(other.children()).all(|(a, b)| a.same_as(b))
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = match self {
            ResolvedNode::Application(app) => writeln!(out, "{indent}application {}", app.name),
            ResolvedNode::Route(r) => match &r.data.path {
                Some(path) if r.data.exact => writeln!(out, "{indent}route {path} (exact)"),
                Some(path) => writeln!(out, "{indent}route {path}"),
                None => writeln!(out, "{indent}route (default)"),
            },
            ResolvedNode::Element(e) => writeln!(out, "{indent}<{}>", e.data.tag),
            ResolvedNode::Text(t) => writeln!(out, "{indent}#text {:?}", t.value),
            ResolvedNode::Comment(c) => writeln!(out, "{indent}#comment {:?}", c.value),
            ResolvedNode::Doctype(name) => writeln!(out, "{indent}<!DOCTYPE {name}>"),
            ResolvedNode::Fragment(f) => {
                writeln!(out, "{indent}fragment {}", f.name.as_deref().unwrap_or("?"))
            }
            ResolvedNode::Assets => writeln!(out, "{indent}assets"),
            ResolvedNode::RouterContent => writeln!(out, "{indent}router-content"),
        };
        for child in self.children() {
            child.write_outline(out, depth + 1);
        }
    }
}

/// Render an indented outline of a node list.
pub fn outline(nodes: &[ResolvedNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_outline(&mut out, 0);
    }
    out
}

/// The resolved routes of one router element.
#[derive(Debug, Clone)]
pub struct ResolvedRoutes {
    pub mode: RoutingMode,
    /// Normalized base path, always starting with `/`.
    pub base: String,
    /// Selector of the element routes are placed into on the client.
    pub container_el: String,
    pub routes: Vec<ResolvedNode>,
    /// Absolute source path to absolute target path.
    pub redirects: BTreeMap<String, String>,
}

impl ResolvedRoutes {
    /// Names of every application reachable in the tree, in document order.
    pub fn application_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for node in &self.routes {
            node.visit(&mut |n| {
                if let ResolvedNode::Application(app) = n {
                    if !names.contains(&app.name) {
                        names.push(app.name.clone());
                    }
                }
            });
        }
        names
    }

    pub fn outline(&self) -> String {
        outline(&self.routes)
    }
}

/// A host document with its router element resolved.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    /// The document, with the router element replaced by `RouterContent`.
    pub nodes: Vec<ResolvedNode>,
    pub routes: ResolvedRoutes,
}
