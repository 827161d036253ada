//! Logical applications.
//!
//! An application may be placed in several route branches. The orchestration
//! runtime registers it once, so every placement of the same name is merged
//! into one [`LogicalApplication`] whose activity and props follow whichever
//! placement is active.

use std::collections::BTreeMap;
use std::sync::Arc;

use url::Url;

use crate::layout::model::{Application, PropValue, ResolvedNode, ResolvedRoutes};
use crate::layout::path::ActiveWhen;

/// One placement of an application with the predicates of its enclosing routes.
#[derive(Debug, Clone)]
pub struct Placement {
    pub application: Arc<Application>,
    pub route_chain: Vec<ActiveWhen>,
}

impl Placement {
    pub fn is_active(&self, url: &Url) -> bool {
        self.route_chain.iter().all(|p| p.test(url))
    }
}

/// All placements of one application name.
#[derive(Debug, Clone)]
pub struct LogicalApplication {
    pub name: String,
    pub placements: Vec<Placement>,
}

impl LogicalApplication {
    /// True when any placement is active.
    pub fn is_active(&self, url: &Url) -> bool {
        self.placements.iter().any(|p| p.is_active(url))
    }

    /// Props of the first active placement, always including `name`.
    pub fn props_for(&self, url: &Url) -> BTreeMap<String, PropValue> {
        let mut props = self
            .placements
            .iter()
            .find(|p| p.is_active(url))
            .map(|p| p.application.props.clone())
            .unwrap_or_default();
        props.insert(
            "name".to_string(),
            PropValue::Value(serde_json::Value::String(self.name.clone())),
        );
        props
    }
}

/// Merge every application placement by name, in first-occurrence order.
pub fn construct_applications(routes: &ResolvedRoutes) -> Vec<LogicalApplication> {
    let mut apps: Vec<LogicalApplication> = Vec::new();
    let mut chain = Vec::new();
    collect(&routes.routes, &mut chain, &mut apps);
    apps
}

fn collect(nodes: &[ResolvedNode], chain: &mut Vec<ActiveWhen>, apps: &mut Vec<LogicalApplication>) {
    for node in nodes {
        match node {
            ResolvedNode::Application(app) => {
                let placement = Placement {
                    application: app.clone(),
                    route_chain: chain.clone(),
                };
                match apps.iter_mut().find(|a| a.name == app.name) {
                    Some(existing) => existing.placements.push(placement),
                    None => apps.push(LogicalApplication {
                        name: app.name.clone(),
                        placements: vec![placement],
                    }),
                }
            }
            ResolvedNode::Route(route) => {
                chain.push(route.data.active_when.clone());
                collect(&route.children, chain, apps);
                chain.pop();
            }
            other => collect(other.children(), chain, apps),
        }
    }
}
