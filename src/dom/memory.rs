//! In-memory DOM.
//!
//! A small arena-backed document for headless hosts. Every insert and
//! remove is recorded so callers can see exactly which mutations a
//! reconciliation performed.

use url::Url;

use crate::dom::{Dom, NodeKind, NodeShape};
use crate::layout::input::InputNode;

/// Handle to a node of a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemNodeId(usize);

/// A recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    Insert { node: MemNodeId, parent: MemNodeId },
    Remove { node: MemNodeId },
}

#[derive(Debug)]
struct MemNode {
    shape: NodeShape,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
pub struct MemoryDom {
    nodes: Vec<MemNode>,
    root: usize,
    body: usize,
    url: Url,
    ops: Vec<DomOp>,
}

impl MemoryDom {
    /// An `<html><head></head><body></body></html>` document at `url`.
    pub fn new(url: Url) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: 0,
            body: 0,
            url,
            ops: Vec::new(),
        };
        dom.root = dom.alloc(element_shape("html"));
        let head = dom.alloc(element_shape("head"));
        dom.body = dom.alloc(element_shape("body"));
        dom.attach(dom.root, head, None);
        dom.attach(dom.root, dom.body, None);
        dom
    }

    pub fn body(&self) -> MemNodeId {
        MemNodeId(self.body)
    }

    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Build markup under `parent` without recording operations, as a
    /// server response would have.
    pub fn load(&mut self, parent: MemNodeId, markup: &[InputNode]) {
        for node in markup {
            let id = match node {
                InputNode::Element { tag, attrs, children } => {
                    let mut shape = element_shape(tag);
                    shape.attrs = attrs.iter().map(|a| (a.name.clone(), a.value.clone())).collect();
                    let id = self.alloc(shape);
                    self.load(MemNodeId(id), children);
                    id
                }
                InputNode::Text { value } => self.alloc(char_shape(NodeKind::Text, value)),
                InputNode::Comment { value } => self.alloc(char_shape(NodeKind::Comment, value)),
                InputNode::Doctype { .. } => continue,
            };
            self.attach(parent.0, id, None);
        }
    }

    /// Drain the recorded operations.
    pub fn take_ops(&mut self) -> Vec<DomOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn children(&self, node: MemNodeId) -> Vec<MemNodeId> {
        self.nodes[node.0].children.iter().map(|&c| MemNodeId(c)).collect()
    }

    pub fn is_attached(&self, node: MemNodeId) -> bool {
        let mut current = node.0;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
        }
        current == self.root
    }

    /// Serialize a node's children as compact markup.
    pub fn inner_html(&self, node: MemNodeId) -> String {
        let mut out = String::new();
        for &child in &self.nodes[node.0].children {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        match node.shape.kind {
            NodeKind::Text => out.push_str(&node.shape.text),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&node.shape.text);
                out.push_str("-->");
            }
            NodeKind::Element => {
                out.push('<');
                out.push_str(&node.shape.tag);
                for (name, value) in &node.shape.attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{}>", node.shape.tag));
            }
        }
    }

    fn alloc(&mut self, shape: NodeShape) -> usize {
        self.nodes.push(MemNode {
            shape,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn detach(&mut self, node: usize) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
    }

    fn attach(&mut self, parent: usize, node: usize, reference: Option<usize>) {
        self.detach(node);
        let children = &mut self.nodes[parent].children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, node);
        self.nodes[node].parent = Some(parent);
    }

    fn find(&self, from: usize, pred: &impl Fn(&NodeShape) -> bool) -> Option<usize> {
        if pred(&self.nodes[from].shape) {
            return Some(from);
        }
        self.nodes[from]
            .children
            .iter()
            .find_map(|&child| self.find(child, pred))
    }
}

fn element_shape(tag: &str) -> NodeShape {
    NodeShape {
        kind: NodeKind::Element,
        tag: tag.to_ascii_lowercase(),
        attrs: Vec::new(),
        text: String::new(),
    }
}

fn char_shape(kind: NodeKind, text: &str) -> NodeShape {
    NodeShape {
        kind,
        tag: String::new(),
        attrs: Vec::new(),
        text: text.to_string(),
    }
}

impl Dom for MemoryDom {
    type Node = MemNodeId;

    fn create_element(&mut self, tag: &str) -> MemNodeId {
        MemNodeId(self.alloc(element_shape(tag)))
    }

    fn create_text(&mut self, value: &str) -> MemNodeId {
        MemNodeId(self.alloc(char_shape(NodeKind::Text, value)))
    }

    fn create_comment(&mut self, value: &str) -> MemNodeId {
        MemNodeId(self.alloc(char_shape(NodeKind::Comment, value)))
    }

    fn set_attribute(&mut self, node: &MemNodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[node.0].shape.attrs;
        match attrs.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn shape(&self, node: &MemNodeId) -> NodeShape {
        self.nodes[node.0].shape.clone()
    }

    fn first_child(&self, node: &MemNodeId) -> Option<MemNodeId> {
        self.nodes[node.0].children.first().map(|&c| MemNodeId(c))
    }

    fn next_sibling(&self, node: &MemNodeId) -> Option<MemNodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent].children;
        let index = siblings.iter().position(|&c| c == node.0)?;
        siblings.get(index + 1).map(|&c| MemNodeId(c))
    }

    fn insert_before(&mut self, parent: &MemNodeId, node: &MemNodeId, reference: Option<&MemNodeId>) {
        self.attach(parent.0, node.0, reference.map(|r| r.0));
        self.ops.push(DomOp::Insert {
            node: *node,
            parent: *parent,
        });
    }

    fn remove(&mut self, node: &MemNodeId) {
        self.detach(node.0);
        self.ops.push(DomOp::Remove { node: *node });
    }

    fn element_by_id(&self, id: &str) -> Option<MemNodeId> {
        self.find(self.root, &|shape| {
            shape.kind == NodeKind::Element && shape.attr("id") == Some(id)
        })
        .map(MemNodeId)
    }

    fn query(&self, selector: &str) -> Option<MemNodeId> {
        match selector.strip_prefix('#') {
            Some(id) => self.element_by_id(id),
            None => {
                let tag = selector.to_ascii_lowercase();
                self.find(self.root, &|shape| shape.kind == NodeKind::Element && shape.tag == tag)
                    .map(MemNodeId)
            }
        }
    }

    fn current_url(&self) -> Url {
        self.url.clone()
    }
}
