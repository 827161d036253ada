//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the layout handler
//! - Wire up middleware (tracing, timeout, request ID, concurrency limit)
//! - Bind server to listener and stop on shutdown
//! - Answer redirects, otherwise stream the rendered layout

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::layout::matcher::find_redirect;
use crate::layout::model::ResolvedDocument;
use crate::observability::metrics;
use crate::streaming::collaborators::RenderCollaborators;
use crate::streaming::renderer::{render_document, RenderResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current layout; swapped whole on reload.
    pub layout: Arc<ArcSwap<ResolvedDocument>>,
    pub collaborators: Arc<dyn RenderCollaborators>,
    pub namespace: Arc<str>,
    /// Scheme and host request paths are resolved against.
    pub origin: Url,
}

/// HTTP server for the layout.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", get(layout_handler))
            .route("/", get(layout_handler))
            .with_state(state)
            // One semaphore shared by every route.
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The router, for serving without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until a shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Redirect, or render the layout for the request URL.
async fn layout_handler(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let start = Instant::now();
    let method = method.to_string();

    let mut url = state.origin.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());

    // Later reloads do not affect a response already under way.
    let document = state.layout.load_full();

    if let Some(to) = find_redirect(&document.routes, &url) {
        tracing::info!(from = %uri.path(), to = %to, "Redirecting");
        metrics::record_redirect();
        metrics::record_request(&method, StatusCode::FOUND.as_u16(), start);
        return match HeaderValue::from_str(to) {
            Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            Err(e) => {
                tracing::error!(to = %to, error = %e, "Redirect target is not a valid header");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
    }

    let RenderResult { body, headers } =
        render_document(&document, &url, state.collaborators.clone(), &state.namespace);
    let headers = headers.await;

    let mut response = Response::new(Body::from_stream(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response.headers_mut().extend(headers);

    metrics::record_request(&method, StatusCode::OK.as_u16(), start);
    tracing::debug!(url = %url, elapsed_ms = start.elapsed().as_millis() as u64, "Response headers sent");
    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use futures_util::future::{self, BoxFuture, FutureExt};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::layout::{resolve_document, InputNode, LayoutData, ResolveOptions};
    use crate::streaming::collaborators::{ApplicationRender, PropsFuture};
    use crate::streaming::error::RenderError;
    use crate::streaming::merge::Source;

    struct Echo;

    impl RenderCollaborators for Echo {
        fn render_application(&self, app_name: &str, _props: PropsFuture) -> Result<ApplicationRender, RenderError> {
            Ok(ApplicationRender::content(format!("<p>{app_name}</p>")))
        }

        fn render_fragment(&self, name: &str) -> Result<Source, RenderError> {
            Err(RenderError::UnknownFragment(name.to_string()))
        }

        fn retrieve_headers(&self, _app_name: &str, _props: PropsFuture) -> BoxFuture<'static, Result<HeaderMap, RenderError>> {
            let mut headers = HeaderMap::new();
            headers.insert("x-layout", HeaderValue::from_static("1"));
            future::ready(Ok(headers)).boxed()
        }

        fn retrieve_prop(&self, _prop_name: &str) -> BoxFuture<'static, Result<Value, RenderError>> {
            future::ready(Ok(Value::Null)).boxed()
        }
    }

    /// Holds every response at the header stage until the gate opens.
    struct Gated(Arc<tokio::sync::Notify>);

    impl RenderCollaborators for Gated {
        fn render_application(&self, app_name: &str, props: PropsFuture) -> Result<ApplicationRender, RenderError> {
            Echo.render_application(app_name, props)
        }

        fn render_fragment(&self, name: &str) -> Result<Source, RenderError> {
            Echo.render_fragment(name)
        }

        fn retrieve_headers(&self, _app_name: &str, _props: PropsFuture) -> BoxFuture<'static, Result<HeaderMap, RenderError>> {
            let gate = self.0.clone();
            async move {
                gate.notified().await;
                Ok(HeaderMap::new())
            }
            .boxed()
        }

        fn retrieve_prop(&self, prop_name: &str) -> BoxFuture<'static, Result<Value, RenderError>> {
            Echo.retrieve_prop(prop_name)
        }
    }

    fn document() -> ResolvedDocument {
        resolve_document(
            &[InputNode::element(
                "single-spa-router",
                &[],
                vec![
                    InputNode::element("application", &[("name", "nav")], vec![]),
                    InputNode::element("redirect", &[("from", "/old"), ("to", "/new")], vec![]),
                ],
            )],
            &LayoutData::default(),
            &ResolveOptions::default(),
        )
        .unwrap()
    }

    fn router_with(config: &ServerConfig, collaborators: Arc<dyn RenderCollaborators>) -> Router {
        let state = AppState {
            layout: Arc::new(ArcSwap::from_pointee(document())),
            collaborators,
            namespace: Arc::from("app"),
            origin: Url::parse("http://localhost").unwrap(),
        };
        HttpServer::new(config, state).into_router()
    }

    fn router() -> Router {
        router_with(&ServerConfig::default(), Arc::new(Echo))
    }

    #[tokio::test]
    async fn test_redirect_has_location_and_no_body() {
        let res = router()
            .oneshot(Request::get("/old").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/new");
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_renders_layout_with_headers() {
        let res = router()
            .oneshot(Request::get("/anything").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-layout"], "1");
        assert!(res.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "<div id=\"app:nav\"><p>nav</p></div>");
    }

    #[tokio::test]
    async fn test_requests_beyond_limit_wait_for_a_slot() {
        let mut config = ServerConfig::default();
        config.listener.max_connections = 1;
        let gate = Arc::new(tokio::sync::Notify::new());
        let router = router_with(&config, Arc::new(Gated(gate.clone())));

        let first = tokio::spawn(
            router
                .clone()
                .oneshot(Request::get("/").body(Body::empty()).unwrap()),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap());
        tokio::pin!(second);
        assert!(tokio::time::timeout(Duration::from_millis(100), &mut second)
            .await
            .is_err());

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap().status(), StatusCode::OK);
        gate.notify_one();
        assert_eq!(second.await.unwrap().status(), StatusCode::OK);
    }
}
