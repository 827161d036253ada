//! Adoption of server-rendered markup.
//!
//! Walks the live DOM in parallel with the resolved tree before the first
//! reconciliation, pairing each DOM-capable node with the next non-blank
//! live sibling when the two are shallowly equal. Nothing is mutated; the
//! pairs seed the engine's connected-node table.

use std::collections::HashMap;

use url::Url;

use crate::dom::{Dom, NodeKind, NodeShape};
use crate::layout::model::{container_id, NodeId, ResolvedNode};

/// Record connected nodes for the active part of `nodes` under `parent`.
pub fn hydrate<D: Dom>(
    dom: &D,
    parent: &D::Node,
    nodes: &[ResolvedNode],
    url: &Url,
    namespace: &str,
    connected: &mut HashMap<NodeId, D::Node>,
) -> usize {
    let before = connected.len();
    let mut cursor = dom.first_child(parent);
    hydrate_level(dom, nodes, url, namespace, &mut cursor, connected);
    let adopted = connected.len() - before;
    tracing::debug!(adopted, "Hydrated server-rendered nodes");
    adopted
}

fn hydrate_level<D: Dom>(
    dom: &D,
    nodes: &[ResolvedNode],
    url: &Url,
    namespace: &str,
    cursor: &mut Option<D::Node>,
    connected: &mut HashMap<NodeId, D::Node>,
) {
    for node in nodes {
        match node {
            ResolvedNode::Route(route) => {
                if route.data.active_when.test(url) {
                    hydrate_level(dom, &route.children, url, namespace, cursor, connected);
                }
            }
            ResolvedNode::Application(app) => {
                // Containers are found by id later; only step over them here.
                let expected = container_id(namespace, &app.name);
                if let Some(candidate) = next_non_blank(dom, cursor.clone()) {
                    if dom.shape(&candidate).attr("id") == Some(expected.as_str()) {
                        *cursor = dom.next_sibling(&candidate);
                    }
                }
            }
            ResolvedNode::Element(element) => {
                let Some(candidate) = next_non_blank(dom, cursor.clone()) else {
                    continue;
                };
                if shallow_equal(&dom.shape(&candidate), node) {
                    let mut child_cursor = dom.first_child(&candidate);
                    hydrate_level(dom, &element.children, url, namespace, &mut child_cursor, connected);
                    *cursor = dom.next_sibling(&candidate);
                    connected.insert(element.data.id, candidate);
                }
            }
            ResolvedNode::Text(data) | ResolvedNode::Comment(data) => {
                let Some(candidate) = next_non_blank(dom, cursor.clone()) else {
                    continue;
                };
                if shallow_equal(&dom.shape(&candidate), node) {
                    *cursor = dom.next_sibling(&candidate);
                    connected.insert(data.id, candidate);
                }
            }
            ResolvedNode::Doctype(_)
            | ResolvedNode::Fragment(_)
            | ResolvedNode::Assets
            | ResolvedNode::RouterContent => {}
        }
    }
}

fn next_non_blank<D: Dom>(dom: &D, mut cursor: Option<D::Node>) -> Option<D::Node> {
    while let Some(node) = cursor {
        if !dom.shape(&node).is_blank_text() {
            return Some(node);
        }
        cursor = dom.next_sibling(&node);
    }
    None
}

/// Same node type, same tag and the same attribute set.
pub fn shallow_equal(shape: &NodeShape, node: &ResolvedNode) -> bool {
    match node {
        ResolvedNode::Element(element) => {
            shape.kind == NodeKind::Element
                && shape.tag.eq_ignore_ascii_case(&element.data.tag)
                && shape.attrs.len() == element.data.attrs.len()
                && element
                    .data
                    .attrs
                    .iter()
                    .all(|a| shape.attr(&a.name) == Some(a.value.as_str()))
        }
        ResolvedNode::Text(data) => shape.kind == NodeKind::Text && shape.text == data.value,
        ResolvedNode::Comment(data) => shape.kind == NodeKind::Comment && shape.text == data.value,
        _ => false,
    }
}
