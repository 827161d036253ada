//! Tree-driven server renderer.
//!
//! # Responsibilities
//! - Walk a resolved document in document order and serialize it
//! - Substitute application containers, fragment slots and the assets slot
//!   with collaborator output
//! - Start every collaborator call during the walk, not when its turn to
//!   drain arrives
//! - Collect per-application headers and props for the response
//!
//! # Design Decisions
//! - One [`OrderedMerge`] for the body, a nested one for assets
//! - Adjacent literal markup is coalesced into a single queued chunk
//! - Failures are isolated per node: logged, counted, replaced by nothing

use std::sync::Arc;

use axum::http::HeaderMap;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use url::Url;

use crate::layout::matcher::match_routes;
use crate::layout::model::{
    container_id, Application, PropValue, ResolvedDocument, ResolvedNode, DATA_ISLAND_ID,
};
use crate::observability::metrics;
use crate::streaming::collaborators::{AppHeaders, PropMap, PropsFuture, RenderCollaborators};
use crate::streaming::error::RenderError;
use crate::streaming::html;
use crate::streaming::merge::{ByteStream, OrderedMerge, Source};
use crate::streaming::props::PropCache;

/// The outcome of rendering one request.
pub struct RenderResult {
    /// The response body, in document order.
    pub body: ByteStream,
    /// Assembled response headers; resolves once every application answered.
    pub headers: BoxFuture<'static, HeaderMap>,
}

/// Render a resolved document for `url`.
///
/// Must be called inside a Tokio runtime: collaborator futures are spawned
/// during the walk.
pub fn render_document(
    document: &ResolvedDocument,
    url: &Url,
    collaborators: Arc<dyn RenderCollaborators>,
    namespace: &str,
) -> RenderResult {
    let body = OrderedMerge::new();
    let mut walk = Walk {
        document,
        url,
        namespace,
        props: PropCache::new(collaborators.clone()),
        collaborators: collaborators.clone(),
        body: body.clone(),
        assets: OrderedMerge::new(),
        assets_placed: false,
        pending_text: String::new(),
        headers: Vec::new(),
        app_props: Vec::new(),
    };

    walk.walk_nodes(&document.nodes, None);
    walk.flush();
    walk.assets.end();
    body.end();

    let headers = walk.headers;
    RenderResult {
        body: body.into_stream(),
        headers: assemble_headers(collaborators, headers).boxed(),
    }
}

struct Walk<'a> {
    document: &'a ResolvedDocument,
    url: &'a Url,
    namespace: &'a str,
    collaborators: Arc<dyn RenderCollaborators>,
    props: PropCache,
    body: OrderedMerge,
    assets: OrderedMerge,
    assets_placed: bool,
    pending_text: String,
    headers: Vec<(String, JoinHandle<Result<HeaderMap, RenderError>>)>,
    app_props: Vec<(String, BoxFuture<'static, Result<PropMap, RenderError>>)>,
}

impl Walk<'_> {
    fn text(&mut self, s: &str) {
        self.pending_text.push_str(s);
    }

    fn flush(&mut self) {
        if !self.pending_text.is_empty() {
            let text = std::mem::take(&mut self.pending_text);
            self.add(Source::from(text), "markup");
        }
    }

    fn source(&mut self, source: Source, name: &str) {
        self.flush();
        self.add(source, name);
    }

    fn add(&self, source: Source, name: &str) {
        // The body is only ended after the walk, so this cannot fail.
        if let Err(e) = self.body.add(source, Some(name)) {
            tracing::error!(error = %e, "Failed to queue body content");
        }
    }

    fn walk_nodes(&mut self, nodes: &[ResolvedNode], parent_tag: Option<&str>) {
        for node in nodes {
            self.walk_node(node, parent_tag);
        }
    }

    fn walk_node(&mut self, node: &ResolvedNode, parent_tag: Option<&str>) {
        match node {
            ResolvedNode::Element(element) => {
                let tag = element.data.tag.as_str();
                self.text(&html::open_tag(tag, &element.data.attrs));
                if !html::is_void(tag) {
                    self.walk_nodes(&element.children, Some(tag));
                    self.text(&html::close_tag(tag));
                }
            }
            ResolvedNode::Text(text) => {
                if parent_tag.is_some_and(html::is_raw_text) {
                    self.text(&text.value);
                } else {
                    self.text(&html::escape_text(&text.value));
                }
            }
            ResolvedNode::Comment(comment) => {
                self.text(&format!("<!--{}-->", comment.value));
            }
            ResolvedNode::Doctype(name) => {
                self.text(&format!("<!DOCTYPE {name}>"));
            }
            ResolvedNode::Route(route) => self.walk_nodes(&route.children, parent_tag),
            ResolvedNode::Application(app) => self.application(app),
            ResolvedNode::Fragment(slot) => {
                let label = format!("fragment:{}", slot.name.as_deref().unwrap_or("?"));
                let rendered = match &slot.name {
                    None => Err(RenderError::MissingFragmentName),
                    Some(name) => self.collaborators.render_fragment(name),
                };
                match rendered {
                    Ok(source) => self.source(eager(&label, source).isolate(node_failed(&label)), &label),
                    Err(e) => node_failed(&label)(&e),
                }
            }
            ResolvedNode::Assets => {
                if self.assets_placed {
                    tracing::warn!("Document has more than one assets slot; ignoring extra slot");
                    return;
                }
                self.assets_placed = true;
                let assets = Source::Merge(self.assets.clone());
                self.source(assets, "assets");
            }
            ResolvedNode::RouterContent => {
                let matched = match_routes(&self.document.routes, self.url);
                self.walk_nodes(&matched.routes, parent_tag);
                self.data_island();
            }
        }
    }

    fn application(&mut self, app: &Arc<Application>) {
        let name = app.name.as_str();
        let props = self.props_future(app);

        let id = container_id(self.namespace, name);
        self.text(&format!("<div id=\"{}\">", html::escape_attribute(&id)));

        let label = format!("application:{name}");
        match self.collaborators.render_application(name, props.clone()) {
            Ok(render) => {
                self.source(eager(&label, render.content).isolate(node_failed(&label)), &label);
                if let Some(assets) = render.assets {
                    let assets = eager(&label, assets).isolate(node_failed(&label));
                    if let Err(e) = self.assets.add(assets, Some(&label)) {
                        tracing::error!(error = %e, "Failed to queue application assets");
                    }
                }
                if let Some(extra) = render.props {
                    self.app_props.push((name.to_string(), extra));
                }
            }
            Err(e) => node_failed(&label)(&e),
        }
        self.text("</div>");

        let headers = self.collaborators.retrieve_headers(name, props);
        self.headers.push((name.to_string(), tokio::spawn(headers)));
    }

    /// All props of an application, with deferred ones fetched through the cache.
    fn props_future(&self, app: &Application) -> PropsFuture {
        let mut known = Map::new();
        let mut pending = Vec::new();
        for (key, value) in &app.props {
            match value {
                PropValue::Value(v) => {
                    known.insert(key.clone(), v.clone());
                }
                PropValue::Deferred => pending.push((key.clone(), self.props.get(key))),
            }
        }
        let name = app.name.clone();
        async move {
            for (key, value) in pending {
                known.insert(key, value.await?);
            }
            known.insert("name".to_string(), Value::String(name));
            Ok(known)
        }
        .boxed()
        .shared()
    }

    /// Queue the JSON data island after the router content.
    fn data_island(&mut self) {
        if self.props.is_empty() && self.app_props.is_empty() {
            return;
        }
        let names = self.props.names();
        let cache = self.props.clone();
        let extra = std::mem::take(&mut self.app_props);

        let island = async move {
            let mut props = Map::new();
            for name in names {
                match cache.get(&name).await {
                    Ok(value) => {
                        props.insert(name, value);
                    }
                    Err(e) => node_failed("prop")(&e),
                }
            }
            let mut applications = Map::new();
            for (app, fut) in extra {
                match fut.await {
                    Ok(values) => {
                        let entry = applications
                            .entry(app)
                            .or_insert_with(|| Value::Object(Map::new()));
                        if let Value::Object(existing) = entry {
                            existing.extend(values);
                        }
                    }
                    Err(e) => node_failed("props")(&e),
                }
            }
            let data = serde_json::json!({ "props": props, "applications": applications });
            Ok(Source::from(format!(
                "<script type=\"application/json\" id=\"{DATA_ISLAND_ID}\">{}</script>",
                html::script_safe_json(&data)
            )))
        };
        self.source(
            Source::spawn("data-island", island).isolate(node_failed("data-island")),
            "data-island",
        );
    }
}

/// Start pending content now instead of when it is drained.
fn eager(label: &str, source: Source) -> Source {
    match source {
        Source::Pending(fut) => Source::spawn(label, fut),
        other => other,
    }
}

fn node_failed(label: &str) -> impl Fn(&RenderError) + Send + 'static {
    let label = label.to_string();
    move |e| {
        tracing::error!(node = %label, error = %e, "Render failed; substituting empty content");
        metrics::record_render_error(&label);
    }
}

async fn assemble_headers(
    collaborators: Arc<dyn RenderCollaborators>,
    pending: Vec<(String, JoinHandle<Result<HeaderMap, RenderError>>)>,
) -> HeaderMap {
    let mut all = Vec::with_capacity(pending.len());
    for (app_name, handle) in pending {
        match handle.await {
            Ok(Ok(headers)) => all.push(AppHeaders { app_name, headers }),
            Ok(Err(e)) => node_failed(&format!("headers:{app_name}"))(&e),
            Err(e) => tracing::error!(app = %app_name, error = %e, "Header task failed"),
        }
    }
    collaborators.assemble_headers(all)
}
