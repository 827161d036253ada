//! Route tree resolution.
//!
//! # Responsibilities
//! - Validate the shape of the router element and its descendants
//! - Compose nested route paths and compute activation predicates
//! - Extract redirects into a flat map
//! - Bind props, loaders and error displays from layout data
//!
//! # Design Decisions
//! - Runs once per configuration load; the result is immutable
//! - Default routes are scoped to one nesting level. Passthrough elements
//!   are transparent, so their routes join the enclosing level
//! - Fails fast with the property path of the offending node

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::layout::error::{ActivationError, ConfigurationError};
use crate::layout::input::{Attribute, InputNode, LayoutData};
use crate::layout::model::{
    Application, ElementData, ElementNode, FragmentSlot, NodeId, PropValue, ResolvedDocument,
    ResolvedNode, ResolvedRoutes, RouteData, RouteNode, TextData,
};
use crate::layout::path::{base_active_when, path_active_when, resolve_path, ActiveWhen, RoutingMode};

const ROUTER_TAGS: &[&str] = &["single-spa-router", "router"];
const ROUTER_ATTRS: &[&str] = &["base", "mode", "containerel"];

/// Options controlling resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Unknown top-level properties are errors instead of warnings.
    pub strict: bool,
    /// Props missing from layout data resolve to [`PropValue::Deferred`].
    pub defer_missing_props: bool,
}

/// Resolve a router element (optionally wrapped in a `<template>`).
pub fn resolve(
    router: &InputNode,
    data: &LayoutData,
    options: &ResolveOptions,
) -> Result<ResolvedRoutes, ConfigurationError> {
    let mut resolver = Resolver::new(data, options);
    resolver.resolve_router(unwrap_template(router).ok_or(ConfigurationError::NoRouter)?)
}

/// Resolve a whole host document for server rendering.
///
/// The router element (or the `<template>` wrapping it) is replaced by a
/// [`ResolvedNode::RouterContent`] marker.
pub fn resolve_document(
    document: &[InputNode],
    data: &LayoutData,
    options: &ResolveOptions,
) -> Result<ResolvedDocument, ConfigurationError> {
    let mut resolver = Resolver::new(data, options);
    let mut routes = None;
    let nodes = resolver.resolve_document_nodes(document, &mut routes)?;
    Ok(ResolvedDocument {
        nodes,
        routes: routes.ok_or(ConfigurationError::NoRouter)?,
    })
}

fn is_router(node: &InputNode) -> bool {
    node.tag().is_some_and(|t| ROUTER_TAGS.contains(&t.as_str()))
}

fn unwrap_template(node: &InputNode) -> Option<&InputNode> {
    if is_router(node) {
        return Some(node);
    }
    if node.tag().as_deref() == Some("template") {
        return node.children().iter().find(|c| is_router(c));
    }
    None
}

fn flag(node: &InputNode, name: &str) -> bool {
    node.attr(name).is_some_and(|v| !v.eq_ignore_ascii_case("false"))
}

/// Sibling path predicates of one routing level.
///
/// Filled once the whole level is resolved so default routes see every
/// path-bearing sibling regardless of position.
type SiblingCell = Arc<OnceLock<Vec<ActiveWhen>>>;

/// Inherited context for one routing level.
struct Scope {
    active_when: ActiveWhen,
    path: String,
    props: BTreeMap<String, PropValue>,
}

struct Resolver<'a> {
    data: &'a LayoutData,
    options: &'a ResolveOptions,
    mode: RoutingMode,
    base: String,
    next_id: NodeId,
    redirects: BTreeMap<String, String>,
}

impl<'a> Resolver<'a> {
    fn new(data: &'a LayoutData, options: &'a ResolveOptions) -> Self {
        Self {
            data,
            options,
            mode: RoutingMode::History,
            base: "/".to_string(),
            next_id: 0,
            redirects: BTreeMap::new(),
        }
    }

    fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn resolve_router(&mut self, router: &InputNode) -> Result<ResolvedRoutes, ConfigurationError> {
        let path = "routesConfig";

        if let InputNode::Element { attrs, .. } = router {
            for attr in attrs {
                let name = attr.name.to_ascii_lowercase();
                if !ROUTER_ATTRS.contains(&name.as_str()) {
                    if self.options.strict {
                        return Err(ConfigurationError::UnknownProperty {
                            path: path.to_string(),
                            property: attr.name.clone(),
                        });
                    }
                    tracing::warn!(path, property = %attr.name, "Unknown property in routes config");
                }
            }
        }

        self.mode = match router.attr("mode") {
            None => RoutingMode::History,
            Some(mode) => RoutingMode::parse(mode).ok_or_else(|| ConfigurationError::InvalidNode {
                path: format!("{path}.mode"),
                message: format!("mode must be `history` or `hash`, got `{mode}`"),
            })?,
        };
        let base = resolve_path("/", router.attr("base").unwrap_or("/"));
        self.base = base.clone();
        let container_el = router.attr("containerEl").unwrap_or("body").to_string();

        let scope = Scope {
            active_when: base_active_when(&base, self.mode),
            path: base.clone(),
            props: BTreeMap::new(),
        };
        let routes = self.resolve_level(router.children(), &scope, &format!("{path}.routes"))?;

        tracing::debug!(
            base = %base,
            mode = ?self.mode,
            redirects = self.redirects.len(),
            "Routes resolved"
        );

        Ok(ResolvedRoutes {
            mode: self.mode,
            base,
            container_el,
            routes,
            redirects: std::mem::take(&mut self.redirects),
        })
    }

    /// Resolve one nesting level with a fresh sibling list.
    fn resolve_level(
        &mut self,
        nodes: &[InputNode],
        scope: &Scope,
        path: &str,
    ) -> Result<Vec<ResolvedNode>, ConfigurationError> {
        let cell: SiblingCell = Arc::new(OnceLock::new());
        let mut siblings = Vec::new();
        let resolved = self.resolve_children(nodes, scope, &cell, &mut siblings, path)?;
        let _ = cell.set(siblings);
        Ok(resolved)
    }

    fn resolve_children(
        &mut self,
        nodes: &[InputNode],
        scope: &Scope,
        cell: &SiblingCell,
        siblings: &mut Vec<ActiveWhen>,
        path: &str,
    ) -> Result<Vec<ResolvedNode>, ConfigurationError> {
        let mut out = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let node_path = format!("{path}[{index}]");
            if let Some(resolved) = self.resolve_node(node, scope, cell, siblings, &node_path)? {
                out.push(resolved);
            }
        }
        Ok(out)
    }

    fn resolve_node(
        &mut self,
        node: &InputNode,
        scope: &Scope,
        cell: &SiblingCell,
        siblings: &mut Vec<ActiveWhen>,
        path: &str,
    ) -> Result<Option<ResolvedNode>, ConfigurationError> {
        let (tag, attrs) = match node {
            InputNode::Text { value } => {
                if node.is_blank_text() {
                    return Ok(None);
                }
                let id = self.next_id();
                return Ok(Some(ResolvedNode::Text(Arc::new(TextData {
                    id,
                    value: value.clone(),
                }))));
            }
            InputNode::Comment { value } => {
                let id = self.next_id();
                return Ok(Some(ResolvedNode::Comment(Arc::new(TextData {
                    id,
                    value: value.clone(),
                }))));
            }
            InputNode::Doctype { .. } => {
                return Err(ConfigurationError::InvalidNode {
                    path: path.to_string(),
                    message: "doctype is not allowed inside routes".to_string(),
                });
            }
            InputNode::Element { tag, attrs, .. } => (tag.to_ascii_lowercase(), attrs),
        };

        let resolved = match tag.as_str() {
            "route" => ResolvedNode::Route(self.resolve_route(node, scope, cell, siblings, path)?),
            "application" => ResolvedNode::Application(self.resolve_application(node, scope, path)?),
            "redirect" => {
                let from = self.required(node, "from", path)?;
                let to = self.required(node, "to", path)?;
                self.redirects
                    .insert(resolve_path(&self.base, from), resolve_path(&self.base, to));
                return Ok(None);
            }
            "fragment" => ResolvedNode::Fragment(Arc::new(FragmentSlot {
                name: node.attr("name").filter(|n| !n.is_empty()).map(str::to_string),
            })),
            "assets" => ResolvedNode::Assets,
            t if ROUTER_TAGS.contains(&t) => {
                return Err(ConfigurationError::InvalidNode {
                    path: path.to_string(),
                    message: "router elements cannot be nested".to_string(),
                });
            }
            _ => {
                let children = self.resolve_children(
                    node.children(),
                    scope,
                    cell,
                    siblings,
                    &format!("{path}.routes"),
                )?;
                ResolvedNode::Element(self.element(&tag, attrs, children))
            }
        };
        Ok(Some(resolved))
    }

    fn resolve_route(
        &mut self,
        node: &InputNode,
        scope: &Scope,
        cell: &SiblingCell,
        siblings: &mut Vec<ActiveWhen>,
        path: &str,
    ) -> Result<RouteNode, ConfigurationError> {
        let route_path = node.attr("path");
        let is_default = flag(node, "default");
        let exact = flag(node, "exact");

        let (full_path, active_when) = match (route_path, is_default) {
            (Some(_), true) => {
                return Err(ActivationError::PathAndDefault {
                    path: path.to_string(),
                }
                .into())
            }
            (None, false) => {
                return Err(ActivationError::NoActivation {
                    path: path.to_string(),
                }
                .into())
            }
            (Some(p), false) => {
                let full = resolve_path(&scope.path, p);
                let active_when = path_active_when(&full, exact, self.mode);
                siblings.push(active_when.clone());
                (Some(full), active_when)
            }
            (None, true) => (None, default_active_when(scope.active_when.clone(), cell.clone())),
        };

        let mut props = scope.props.clone();
        props.extend(self.props(node, &format!("{path}.props"))?);

        let child_scope = Scope {
            active_when: active_when.clone(),
            path: full_path.clone().unwrap_or_else(|| scope.path.clone()),
            props,
        };
        let children = self.resolve_level(node.children(), &child_scope, &format!("{path}.routes"))?;

        Ok(RouteNode {
            data: Arc::new(RouteData {
                path: full_path,
                exact,
                is_default,
                active_when,
            }),
            children,
        })
    }

    fn resolve_application(
        &mut self,
        node: &InputNode,
        scope: &Scope,
        path: &str,
    ) -> Result<Arc<Application>, ConfigurationError> {
        let name = self.required(node, "name", path)?.to_string();
        if node.children().iter().any(|c| !c.is_blank_text()) {
            return Err(ConfigurationError::InvalidNode {
                path: path.to_string(),
                message: format!("application `{name}` cannot have children"),
            });
        }

        let mut props = scope.props.clone();
        props.extend(self.props(node, &format!("{path}.props"))?);

        let loader = self.lookup(node, "loader", "loaders", &self.data.loaders, path)?;
        let error_handler = self.lookup(node, "error", "errors", &self.data.errors, path)?;

        Ok(Arc::new(Application {
            name,
            props,
            loader,
            error_handler,
        }))
    }

    fn element(&mut self, tag: &str, attrs: &[Attribute], children: Vec<ResolvedNode>) -> ElementNode {
        ElementNode {
            data: Arc::new(ElementData {
                id: self.next_id(),
                tag: tag.to_ascii_lowercase(),
                attrs: attrs.to_vec(),
            }),
            children,
        }
    }

    fn required<'n>(
        &self,
        node: &'n InputNode,
        attribute: &str,
        path: &str,
    ) -> Result<&'n str, ConfigurationError> {
        node.attr(attribute)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigurationError::MissingAttribute {
                path: path.to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn props(
        &self,
        node: &InputNode,
        path: &str,
    ) -> Result<BTreeMap<String, PropValue>, ConfigurationError> {
        let mut props = BTreeMap::new();
        let Some(names) = node.attr("props") else {
            return Ok(props);
        };
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let value = match self.data.props.get(name) {
                Some(v) => PropValue::Value(v.clone()),
                None if self.options.defer_missing_props => PropValue::Deferred,
                None => {
                    return Err(ConfigurationError::MissingLayoutData {
                        path: path.to_string(),
                        table: "props",
                        name: name.to_string(),
                    })
                }
            };
            props.insert(name.to_string(), value);
        }
        Ok(props)
    }

    fn lookup(
        &self,
        node: &InputNode,
        attribute: &str,
        table: &'static str,
        values: &BTreeMap<String, Vec<InputNode>>,
        path: &str,
    ) -> Result<Option<Vec<InputNode>>, ConfigurationError> {
        match node.attr(attribute) {
            None => Ok(None),
            Some(name) => values.get(name).cloned().map(Some).ok_or_else(|| {
                ConfigurationError::MissingLayoutData {
                    path: format!("{path}.{attribute}"),
                    table,
                    name: name.to_string(),
                }
            }),
        }
    }

    fn resolve_document_nodes(
        &mut self,
        nodes: &[InputNode],
        routes: &mut Option<ResolvedRoutes>,
    ) -> Result<Vec<ResolvedNode>, ConfigurationError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let resolved = match node {
                InputNode::Doctype { name } => ResolvedNode::Doctype(Arc::from(name.as_str())),
                InputNode::Text { value } => ResolvedNode::Text(Arc::new(TextData {
                    id: self.next_id(),
                    value: value.clone(),
                })),
                InputNode::Comment { value } => ResolvedNode::Comment(Arc::new(TextData {
                    id: self.next_id(),
                    value: value.clone(),
                })),
                InputNode::Element { tag, attrs, .. } => {
                    if let Some(router) = unwrap_template(node) {
                        if routes.is_some() {
                            return Err(ConfigurationError::InvalidNode {
                                path: "document".to_string(),
                                message: "only one router element is allowed".to_string(),
                            });
                        }
                        *routes = Some(self.resolve_router(router)?);
                        out.push(ResolvedNode::RouterContent);
                        continue;
                    }
                    match node.tag().as_deref() {
                        Some("fragment") => ResolvedNode::Fragment(Arc::new(FragmentSlot {
                            name: node.attr("name").filter(|n| !n.is_empty()).map(str::to_string),
                        })),
                        Some("assets") => ResolvedNode::Assets,
                        _ => {
                            let children = self.resolve_document_nodes(node.children(), routes)?;
                            ResolvedNode::Element(self.element(tag, attrs, children))
                        }
                    }
                }
            };
            out.push(resolved);
        }
        Ok(out)
    }
}

/// Active when the parent is and no path-bearing sibling is.
fn default_active_when(parent: ActiveWhen, siblings: SiblingCell) -> ActiveWhen {
    ActiveWhen::new(move |url| {
        parent.test(url)
            && !siblings
                .get()
                .is_some_and(|s| s.iter().any(|active_when| active_when.test(url)))
    })
}
