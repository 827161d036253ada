//! Route matching against a URL.
//!
//! # Responsibilities
//! - Drop inactive routes together with their subtrees
//! - Keep applications and structural nodes in place
//!
//! # Design Decisions
//! - Pure: the input tree is never modified
//! - Leaf payloads are shared with the input; only `children` vectors are new
//! - A URL outside the configured base matches nothing

use url::Url;

use crate::layout::model::{ElementNode, ResolvedNode, ResolvedRoutes, RouteNode};
use crate::layout::path::{resolve_path, within_base};

/// Filter a resolved tree down to the nodes active for `url`.
pub fn match_routes(routes: &ResolvedRoutes, url: &Url) -> ResolvedRoutes {
    ResolvedRoutes {
        routes: if in_base(routes, url) {
            filter_nodes(&routes.routes, url)
        } else {
            tracing::debug!(url = %url, base = %routes.base, "URL outside layout base");
            Vec::new()
        },
        ..routes.clone_without_routes()
    }
}

/// Whether `url`'s routed path lies under the configured base.
pub fn in_base(routes: &ResolvedRoutes, url: &Url) -> bool {
    within_base(&routes.base, &routes.mode.route_path(url))
}

/// Target of the redirect declared for `url`'s routed path, if any.
///
/// Redirect sources and targets are keyed under the base at resolve time.
pub fn find_redirect<'a>(routes: &'a ResolvedRoutes, url: &Url) -> Option<&'a str> {
    let path = resolve_path("/", &routes.mode.route_path(url));
    routes.redirects.get(&path).map(String::as_str)
}

/// Filter a node list without the base check.
pub fn filter_nodes(nodes: &[ResolvedNode], url: &Url) -> Vec<ResolvedNode> {
    nodes.iter().filter_map(|node| filter_node(node, url)).collect()
}

fn filter_node(node: &ResolvedNode, url: &Url) -> Option<ResolvedNode> {
    match node {
        ResolvedNode::Route(route) => {
            if !route.data.active_when.test(url) {
                return None;
            }
            Some(ResolvedNode::Route(RouteNode {
                data: route.data.clone(),
                children: filter_nodes(&route.children, url),
            }))
        }
        ResolvedNode::Element(element) => Some(ResolvedNode::Element(ElementNode {
            data: element.data.clone(),
            children: filter_nodes(&element.children, url),
        })),
        ResolvedNode::Application(_)
        | ResolvedNode::Text(_)
        | ResolvedNode::Comment(_)
        | ResolvedNode::Doctype(_)
        | ResolvedNode::Fragment(_)
        | ResolvedNode::Assets
        | ResolvedNode::RouterContent => Some(node.clone()),
    }
}

impl ResolvedRoutes {
    fn clone_without_routes(&self) -> ResolvedRoutes {
        ResolvedRoutes {
            mode: self.mode,
            base: self.base.clone(),
            container_el: self.container_el.clone(),
            routes: Vec::new(),
            redirects: self.redirects.clone(),
        }
    }
}
