//! Client layout engine.
//!
//! # Responsibilities
//! - React to the orchestration runtime's navigation lifecycle
//! - Keep application containers and passthrough markup in document order
//! - Mount declared error displays when an application fails
//!
//! # Design Decisions
//! - Runs synchronously to completion inside one event; never awaits
//! - Application containers are never removed by the arrange walk. The
//!   mount lifecycle owns their removal
//! - A container is only moved when it is not already where it belongs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use url::Url;

use crate::dom::hydrate::hydrate;
use crate::dom::{Dom, EngineError, Orchestrator, RuntimeAppError};
use crate::layout::applications::{construct_applications, LogicalApplication, Placement};
use crate::layout::error::ConfigurationError;
use crate::layout::input::{InputNode, LayoutData};
use crate::layout::matcher::{find_redirect, in_base};
use crate::layout::model::{
    container_id, Application, NodeId, ResolvedNode, ResolvedRoutes, DATA_ISLAND_ID, DEFAULT_NAMESPACE,
};
use crate::layout::resolver::{resolve, ResolveOptions};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Prefix of application container ids.
    pub namespace: String,
    /// Adopt server-rendered markup on first activation.
    pub hydrate: bool,
    /// Do not hand application errors back to the host.
    pub quiet: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            hydrate: false,
            quiet: false,
        }
    }
}

/// Lifecycle notifications from the orchestration runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeforeRouting { url: Url },
    BeforeMountRouting { url: Url },
    RoutingComplete { url: Url },
    ApplicationUnmounted { name: String },
    ApplicationError { name: String, message: String },
}

/// What the host should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The engine is inactive.
    Ignored,
    Continue,
    /// Navigate to this path instead.
    Redirect(String),
    /// The DOM was arranged for the new URL.
    Arranged,
}

pub struct LayoutEngine<D: Dom, O: Orchestrator> {
    routes: Arc<ResolvedRoutes>,
    applications: Vec<LogicalApplication>,
    dom: D,
    orchestrator: O,
    options: EngineOptions,
    active: bool,
    hydrated: bool,
    location: Option<Url>,
    connected: HashMap<NodeId, D::Node>,
}

impl<D: Dom, O: Orchestrator> LayoutEngine<D, O> {
    pub fn new(routes: Arc<ResolvedRoutes>, dom: D, orchestrator: O, options: EngineOptions) -> Self {
        let applications = construct_applications(&routes);
        Self {
            routes,
            applications,
            dom,
            orchestrator,
            options,
            active: false,
            hydrated: false,
            location: None,
            connected: HashMap::new(),
        }
    }

    /// Resolve `router` against the live document and build an engine.
    ///
    /// Props the server fetched on demand are read back from its data
    /// island, so they need not be present in `data`.
    pub fn boot(
        router: &InputNode,
        mut data: LayoutData,
        dom: D,
        orchestrator: O,
        options: EngineOptions,
    ) -> Result<Self, ConfigurationError> {
        if let Some(island) = dom.script_data(DATA_ISLAND_ID) {
            if let Err(e) = data.merge_island(&island) {
                tracing::warn!(error = %e, "Ignoring malformed layout data island");
            }
        }
        let routes = resolve(router, &data, &ResolveOptions::default())?;
        Ok(Self::new(Arc::new(routes), dom, orchestrator, options))
    }

    /// Start reacting to lifecycle events and arrange for the current URL.
    pub fn activate(&mut self) -> Result<(), ConfigurationError> {
        if self.active {
            return Ok(());
        }

        let url = self.dom.current_url();
        let container = self.container()?;
        if self.options.hydrate && !self.hydrated {
            let routes = self.routes.clone();
            hydrate(
                &self.dom,
                &container,
                &routes.routes,
                &url,
                &self.options.namespace,
                &mut self.connected,
            );
        }
        self.hydrated = true;
        self.arrange(&url)?;
        self.active = true;

        tracing::info!(url = %url, "Layout engine activated");
        Ok(())
    }

    /// Stop reacting to events. The DOM is left as it is.
    pub fn deactivate(&mut self) {
        if self.active {
            self.active = false;
            tracing::info!("Layout engine deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&mut self, event: LifecycleEvent) -> Result<EventOutcome, EngineError> {
        if !self.active {
            return Ok(EventOutcome::Ignored);
        }
        match event {
            LifecycleEvent::BeforeRouting { url } => match find_redirect(&self.routes, &url) {
                Some(to) => {
                    tracing::info!(from = %url.path(), to = %to, "Redirecting");
                    Ok(EventOutcome::Redirect(to.to_string()))
                }
                None => Ok(EventOutcome::Continue),
            },
            LifecycleEvent::BeforeMountRouting { url } => {
                self.arrange(&url)?;
                Ok(EventOutcome::Arranged)
            }
            LifecycleEvent::RoutingComplete { url } => {
                tracing::debug!(url = %url, "Routing complete");
                self.location = Some(url);
                Ok(EventOutcome::Continue)
            }
            LifecycleEvent::ApplicationUnmounted { name } => {
                let id = container_id(&self.options.namespace, &name);
                if let Some(el) = self.dom.element_by_id(&id) {
                    self.dom.remove(&el);
                    tracing::debug!(app = %name, "Removed application container");
                }
                Ok(EventOutcome::Continue)
            }
            LifecycleEvent::ApplicationError { name, message } => {
                tracing::error!(app = %name, error = %message, "Application error");
                self.show_error(&name);
                if self.options.quiet {
                    Ok(EventOutcome::Continue)
                } else {
                    Err(RuntimeAppError {
                        app_name: name,
                        message,
                    }
                    .into())
                }
            }
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn routes(&self) -> &ResolvedRoutes {
        &self.routes
    }

    /// URL of the last completed navigation.
    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// Live node currently representing a resolved node.
    pub fn connected_node(&self, id: NodeId) -> Option<&D::Node> {
        self.connected.get(&id)
    }

    fn container(&self) -> Result<D::Node, ConfigurationError> {
        self.dom
            .query(&self.routes.container_el)
            .ok_or_else(|| ConfigurationError::InvalidNode {
                path: "routesConfig.containerEl".to_string(),
                message: format!("no element matches `{}`", self.routes.container_el),
            })
    }

    /// Put the live DOM in the order the routes require for `url`.
    fn arrange(&mut self, url: &Url) -> Result<(), ConfigurationError> {
        let container = self.container()?;
        let known: HashMap<String, D::Node> = self
            .orchestrator
            .mounted_names()
            .into_iter()
            .filter_map(|name| {
                let el = self
                    .dom
                    .element_by_id(&container_id(&self.options.namespace, &name))?;
                Some((name, el))
            })
            .collect();

        let routes = self.routes.clone();
        let mut placed = HashSet::new();
        let should_mount = in_base(&routes, url);
        self.arrange_level(&routes.routes, url, &container, None, should_mount, &known, &mut placed);

        for name in self.orchestrator.check_active_names(url) {
            if !placed.contains(&name) {
                tracing::warn!(app = %name, url = %url, "Active application has no placement for this URL");
            }
        }
        tracing::debug!(url = %url, placed = placed.len(), "DOM arranged");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn arrange_level(
        &mut self,
        nodes: &[ResolvedNode],
        url: &Url,
        parent: &D::Node,
        mut previous: Option<D::Node>,
        should_mount: bool,
        known: &HashMap<String, D::Node>,
        placed: &mut HashSet<String>,
    ) -> Option<D::Node> {
        for node in nodes {
            match node {
                ResolvedNode::Application(app) => {
                    if !should_mount {
                        continue;
                    }
                    let el = self.application_container(app, known);
                    self.place(parent, &el, previous.as_ref());
                    placed.insert(app.name.clone());
                    previous = Some(el);
                }
                ResolvedNode::Route(route) => {
                    let active = should_mount && route.data.active_when.test(url);
                    previous = self.arrange_level(&route.children, url, parent, previous, active, known, placed);
                }
                ResolvedNode::Element(element) => {
                    let id = element.data.id;
                    if !should_mount {
                        self.disconnect(id);
                        continue;
                    }
                    let el = self.connect(id, |dom| {
                        let el = dom.create_element(&element.data.tag);
                        for attr in &element.data.attrs {
                            dom.set_attribute(&el, &attr.name, &attr.value);
                        }
                        el
                    });
                    self.place(parent, &el, previous.as_ref());
                    self.arrange_level(&element.children, url, &el, None, true, known, placed);
                    previous = Some(el);
                }
                ResolvedNode::Text(data) => {
                    if !should_mount {
                        self.disconnect(data.id);
                        continue;
                    }
                    let el = self.connect(data.id, |dom| dom.create_text(&data.value));
                    self.place(parent, &el, previous.as_ref());
                    previous = Some(el);
                }
                ResolvedNode::Comment(data) => {
                    if !should_mount {
                        self.disconnect(data.id);
                        continue;
                    }
                    let el = self.connect(data.id, |dom| dom.create_comment(&data.value));
                    self.place(parent, &el, previous.as_ref());
                    previous = Some(el);
                }
                // Server-only slots.
                ResolvedNode::Doctype(_)
                | ResolvedNode::Fragment(_)
                | ResolvedNode::Assets
                | ResolvedNode::RouterContent => {}
            }
        }
        previous
    }

    /// Known mounted container, then an element with the container id,
    /// then a fresh container.
    fn application_container(&mut self, app: &Application, known: &HashMap<String, D::Node>) -> D::Node {
        if let Some(el) = known.get(&app.name) {
            return el.clone();
        }
        let id = container_id(&self.options.namespace, &app.name);
        if let Some(el) = self.dom.element_by_id(&id) {
            return el;
        }

        let el = self.dom.create_element("div");
        self.dom.set_attribute(&el, "id", &id);
        if let Some(loader) = &app.loader {
            self.build(&el, loader);
        }
        tracing::debug!(app = %app.name, "Created application container");
        el
    }

    fn connect(&mut self, id: NodeId, create: impl FnOnce(&mut D) -> D::Node) -> D::Node {
        if let Some(el) = self.connected.get(&id) {
            return el.clone();
        }
        let el = create(&mut self.dom);
        self.connected.insert(id, el.clone());
        el
    }

    fn disconnect(&mut self, id: NodeId) {
        if let Some(el) = self.connected.remove(&id) {
            self.dom.remove(&el);
        }
    }

    /// Insert `node` right after `previous` unless it is already there.
    /// Whitespace-only text between the two does not count as a gap.
    fn place(&mut self, parent: &D::Node, node: &D::Node, previous: Option<&D::Node>) {
        let mut next = match previous {
            Some(prev) => self.dom.next_sibling(prev),
            None => self.dom.first_child(parent),
        };
        while let Some(candidate) = next.clone() {
            if &candidate == node || !self.dom.shape(&candidate).is_blank_text() {
                break;
            }
            next = self.dom.next_sibling(&candidate);
        }
        if next.as_ref() != Some(node) {
            self.dom.insert_before(parent, node, next.as_ref());
        }
    }

    /// Build markup from the layout data into `parent`.
    fn build(&mut self, parent: &D::Node, markup: &[InputNode]) {
        for node in markup {
            let el = match node {
                InputNode::Element { tag, attrs, children } => {
                    let el = self.dom.create_element(tag);
                    for attr in attrs {
                        self.dom.set_attribute(&el, &attr.name, &attr.value);
                    }
                    self.build(&el, children);
                    el
                }
                InputNode::Text { value } => self.dom.create_text(value),
                InputNode::Comment { value } => self.dom.create_comment(value),
                InputNode::Doctype { .. } => continue,
            };
            self.dom.insert_before(parent, &el, None);
        }
    }

    /// Replace a failed application's container content with its error display.
    fn show_error(&mut self, name: &str) {
        let url = self.location.clone().unwrap_or_else(|| self.dom.current_url());
        let Some(markup) = error_display(&self.applications, name, &url) else {
            return;
        };
        let id = container_id(&self.options.namespace, name);
        let Some(container) = self.dom.element_by_id(&id) else {
            tracing::warn!(app = %name, "No container for error display");
            return;
        };
        while let Some(child) = self.dom.first_child(&container) {
            self.dom.remove(&child);
        }
        self.build(&container, &markup);
    }
}

/// Error markup of the active placement, else of any placement declaring one.
fn error_display(applications: &[LogicalApplication], name: &str, url: &Url) -> Option<Vec<InputNode>> {
    let app = applications.iter().find(|a| a.name == name)?;
    let declared = |p: &&Placement| p.application.error_handler.is_some();
    app.placements
        .iter()
        .filter(declared)
        .find(|p| p.is_active(url))
        .or_else(|| app.placements.iter().find(declared))
        .and_then(|p| p.application.error_handler.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dom::{DomOp, MemoryDom};

    #[derive(Default)]
    struct FakeRuntime {
        mounted: Mutex<Vec<String>>,
    }

    impl FakeRuntime {
        fn mounted(names: &[&str]) -> Self {
            Self {
                mounted: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            }
        }
    }

    impl Orchestrator for &FakeRuntime {
        fn check_active_names(&self, _url: &Url) -> Vec<String> {
            Vec::new()
        }

        fn mounted_names(&self) -> Vec<String> {
            self.mounted.lock().unwrap().clone()
        }
    }

    fn url(path: &str) -> Url {
        Url::parse("http://localhost").unwrap().join(path).unwrap()
    }

    fn app(name: &str) -> InputNode {
        InputNode::element("application", &[("name", name)], vec![])
    }

    fn route(path: &str, children: Vec<InputNode>) -> InputNode {
        InputNode::element("route", &[("path", path)], children)
    }

    fn slot_router() -> InputNode {
        InputNode::element(
            "single-spa-router",
            &[],
            vec![
                app("nav"),
                route("app1", vec![app("app1")]),
                route("app2", vec![app("app2")]),
                app("footer"),
            ],
        )
    }

    fn engine<'a>(
        router: &InputNode,
        data: LayoutData,
        path: &str,
        runtime: &'a FakeRuntime,
        options: EngineOptions,
    ) -> LayoutEngine<MemoryDom, &'a FakeRuntime> {
        LayoutEngine::boot(router, data, MemoryDom::new(url(path)), runtime, options).unwrap()
    }

    fn ids(dom: &MemoryDom) -> Vec<String> {
        dom.children(dom.body())
            .into_iter()
            .filter_map(|n| dom.shape(&n).attr("id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_activate_places_active_containers_in_order() {
        let runtime = FakeRuntime::default();
        let mut engine = engine(&slot_router(), LayoutData::default(), "/app1", &runtime, EngineOptions::default());
        engine.activate().unwrap();
        assert!(engine.is_active());
        assert_eq!(
            ids(engine.dom()),
            vec![
                "single-spa-application:nav",
                "single-spa-application:app1",
                "single-spa-application:footer"
            ]
        );
    }

    #[test]
    fn test_navigation_reuses_existing_containers() {
        let runtime = FakeRuntime::mounted(&["nav", "app1", "footer"]);
        let mut engine = engine(&slot_router(), LayoutData::default(), "/app1", &runtime, EngineOptions::default());
        engine.activate().unwrap();
        let dom = engine.dom();
        let nav = dom.element_by_id("single-spa-application:nav").unwrap();
        let footer = dom.element_by_id("single-spa-application:footer").unwrap();

        // The mount lifecycle unmounts app1 before the new URL is arranged.
        engine
            .handle(LifecycleEvent::ApplicationUnmounted { name: "app1".into() })
            .unwrap();
        *runtime.mounted.lock().unwrap() = vec!["nav".into(), "footer".into()];
        engine.dom_mut().take_ops();

        let outcome = engine
            .handle(LifecycleEvent::BeforeMountRouting { url: url("/app2") })
            .unwrap();
        assert_eq!(outcome, EventOutcome::Arranged);

        let app2 = engine.dom().element_by_id("single-spa-application:app2").unwrap();
        let body = engine.dom().body();
        assert_eq!(
            engine.dom_mut().take_ops(),
            vec![DomOp::Insert { node: app2, parent: body }]
        );
        assert_eq!(engine.dom().element_by_id("single-spa-application:nav"), Some(nav));
        assert_eq!(engine.dom().element_by_id("single-spa-application:footer"), Some(footer));
        assert_eq!(
            ids(engine.dom()),
            vec![
                "single-spa-application:nav",
                "single-spa-application:app2",
                "single-spa-application:footer"
            ]
        );
    }

    #[test]
    fn test_arrange_does_not_remove_inactive_application() {
        let runtime = FakeRuntime::default();
        let mut engine = engine(&slot_router(), LayoutData::default(), "/app1", &runtime, EngineOptions::default());
        engine.activate().unwrap();
        engine.dom_mut().take_ops();

        engine
            .handle(LifecycleEvent::BeforeMountRouting { url: url("/app2") })
            .unwrap();
        let ops = engine.dom_mut().take_ops();
        assert!(ops.iter().all(|op| matches!(op, DomOp::Insert { .. })));
        assert!(engine.dom().element_by_id("single-spa-application:app1").is_some());
    }

    #[test]
    fn test_inactive_markup_is_removed_and_restored() {
        let router = InputNode::element(
            "single-spa-router",
            &[],
            vec![route(
                "settings",
                vec![InputNode::element("h1", &[], vec![InputNode::text("Settings")]), app("settings")],
            )],
        );
        let runtime = FakeRuntime::default();
        let mut engine = engine(&router, LayoutData::default(), "/settings", &runtime, EngineOptions::default());
        engine.activate().unwrap();
        let body = engine.dom().body();
        assert_eq!(
            engine.dom().inner_html(body),
            "<h1>Settings</h1><div id=\"single-spa-application:settings\"></div>"
        );

        engine
            .handle(LifecycleEvent::BeforeMountRouting { url: url("/") })
            .unwrap();
        assert_eq!(
            engine.dom().inner_html(body),
            "<div id=\"single-spa-application:settings\"></div>"
        );

        engine
            .handle(LifecycleEvent::BeforeMountRouting { url: url("/settings") })
            .unwrap();
        assert_eq!(
            engine.dom().inner_html(body),
            "<h1>Settings</h1><div id=\"single-spa-application:settings\"></div>"
        );
    }

    #[test]
    fn test_hydration_adopts_server_markup() {
        let router = InputNode::element(
            "single-spa-router",
            &[],
            vec![
                InputNode::element("header", &[("class", "top")], vec![]),
                app("nav"),
            ],
        );
        let runtime = FakeRuntime::default();
        let mut dom = MemoryDom::new(url("/"));
        let body = dom.body();
        dom.load(
            body,
            &[
                InputNode::element("header", &[("class", "top")], vec![]),
                InputNode::text("\n"),
                InputNode::element("div", &[("id", "single-spa-application:nav")], vec![]),
            ],
        );
        let options = EngineOptions {
            hydrate: true,
            ..EngineOptions::default()
        };
        let mut engine = LayoutEngine::boot(&router, LayoutData::default(), dom, &runtime, options).unwrap();
        engine.activate().unwrap();

        assert!(engine.connected_node(0).is_some());
        let ops = engine.dom_mut().take_ops();
        assert!(ops.is_empty(), "unexpected ops: {ops:?}");
        let headers = engine
            .dom()
            .children(body)
            .into_iter()
            .filter(|n| engine.dom().shape(n).tag == "header")
            .count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn test_loader_is_built_in_fresh_container() {
        let router = InputNode::element(
            "single-spa-router",
            &[],
            vec![InputNode::element("application", &[("name", "nav"), ("loader", "spinner")], vec![])],
        );
        let mut data = LayoutData::default();
        data.loaders.insert(
            "spinner".into(),
            vec![InputNode::element("img", &[("src", "/spin.gif")], vec![])],
        );
        let runtime = FakeRuntime::default();
        let mut engine = engine(&router, data, "/", &runtime, EngineOptions::default());
        engine.activate().unwrap();
        let nav = engine.dom().element_by_id("single-spa-application:nav").unwrap();
        assert_eq!(engine.dom().inner_html(nav), "<img src=\"/spin.gif\"></img>");
    }

    #[test]
    fn test_redirect_decision() {
        let router = InputNode::element(
            "single-spa-router",
            &[],
            vec![InputNode::element("redirect", &[("from", "/old"), ("to", "/new")], vec![])],
        );
        let runtime = FakeRuntime::default();
        let mut engine = engine(&router, LayoutData::default(), "/", &runtime, EngineOptions::default());

        let before = LifecycleEvent::BeforeRouting { url: url("/old") };
        assert_eq!(engine.handle(before.clone()).unwrap(), EventOutcome::Ignored);

        engine.activate().unwrap();
        assert_eq!(engine.handle(before).unwrap(), EventOutcome::Redirect("/new".into()));
        assert_eq!(
            engine
                .handle(LifecycleEvent::BeforeRouting { url: url("/other") })
                .unwrap(),
            EventOutcome::Continue
        );

        engine.deactivate();
        assert!(!engine.is_active());
    }

    #[test]
    fn test_base_scopes_redirects_and_placement() {
        let router = InputNode::element(
            "single-spa-router",
            &[("base", "/shop")],
            vec![
                app("nav"),
                InputNode::element("redirect", &[("from", "/old"), ("to", "/new")], vec![]),
            ],
        );
        let runtime = FakeRuntime::default();
        let mut engine = engine(&router, LayoutData::default(), "/shopping", &runtime, EngineOptions::default());
        engine.activate().unwrap();
        assert!(ids(engine.dom()).is_empty());

        assert_eq!(
            engine
                .handle(LifecycleEvent::BeforeRouting { url: url("/shop/old") })
                .unwrap(),
            EventOutcome::Redirect("/shop/new".into())
        );
        assert_eq!(
            engine
                .handle(LifecycleEvent::BeforeRouting { url: url("/old") })
                .unwrap(),
            EventOutcome::Continue
        );

        engine
            .handle(LifecycleEvent::BeforeMountRouting { url: url("/shop") })
            .unwrap();
        assert_eq!(ids(engine.dom()), vec!["single-spa-application:nav"]);
    }

    #[test]
    fn test_application_error_mounts_display() {
        let router = InputNode::element(
            "single-spa-router",
            &[],
            vec![InputNode::element("application", &[("name", "nav"), ("error", "oops")], vec![])],
        );
        let mut data = LayoutData::default();
        data.errors
            .insert("oops".into(), vec![InputNode::element("p", &[], vec![InputNode::text("Broken")])]);
        let runtime = FakeRuntime::default();
        let mut engine = engine(&router, data, "/", &runtime, EngineOptions::default());
        engine.activate().unwrap();

        let err = engine
            .handle(LifecycleEvent::ApplicationError {
                name: "nav".into(),
                message: "boom".into(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Application(RuntimeAppError {
                app_name: "nav".into(),
                message: "boom".into()
            })
        );
        let nav = engine.dom().element_by_id("single-spa-application:nav").unwrap();
        assert_eq!(engine.dom().inner_html(nav), "<p>Broken</p>");
    }

    #[test]
    fn test_quiet_mode_swallows_application_error() {
        let runtime = FakeRuntime::default();
        let options = EngineOptions {
            quiet: true,
            ..EngineOptions::default()
        };
        let mut engine = engine(&slot_router(), LayoutData::default(), "/", &runtime, options);
        engine.activate().unwrap();
        let outcome = engine
            .handle(LifecycleEvent::ApplicationError {
                name: "nav".into(),
                message: "boom".into(),
            })
            .unwrap();
        assert_eq!(outcome, EventOutcome::Continue);
    }

    #[test]
    fn test_boot_reads_data_island() {
        let router = InputNode::element(
            "single-spa-router",
            &[],
            vec![InputNode::element("application", &[("name", "nav"), ("props", "user")], vec![])],
        );
        let mut dom = MemoryDom::new(url("/"));
        let body = dom.body();
        dom.load(
            body,
            &[InputNode::element(
                "script",
                &[("type", "application/json"), ("id", DATA_ISLAND_ID)],
                vec![InputNode::text(r#"{"props":{"user":"ada"}}"#)],
            )],
        );
        let runtime = FakeRuntime::default();
        let engine = LayoutEngine::boot(&router, LayoutData::default(), dom, &runtime, EngineOptions::default()).unwrap();
        let nav = &construct_applications(engine.routes())[0];
        assert_eq!(
            nav.props_for(&url("/")).get("user"),
            Some(&crate::layout::PropValue::Value(serde_json::json!("ada")))
        );
    }

    #[test]
    fn test_missing_container_element() {
        let router = InputNode::element("single-spa-router", &[("containerEl", "#root")], vec![app("nav")]);
        let runtime = FakeRuntime::default();
        let mut engine = engine(&router, LayoutData::default(), "/", &runtime, EngineOptions::default());
        assert!(matches!(
            engine.activate(),
            Err(ConfigurationError::InvalidNode { .. })
        ));
    }
}
