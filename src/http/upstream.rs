//! HTTP render collaborators.
//!
//! # Responsibilities
//! - Fetch application content from each application's upstream
//! - Fetch application headers and deferred props as JSON
//! - Serve fragments from upstream URLs or inline configuration
//!
//! # Design Decisions
//! - One pooled hyper-util client shared by every request
//! - Each call is bounded by the upstream timeout up to response headers;
//!   bodies are streamed through as they arrive
//! - Every failure becomes a [`RenderError`] so the renderer can isolate it

use std::collections::BTreeMap;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Uri};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::StreamExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use url::Url;

use crate::config::schema::{FragmentSource, ServerConfig};
use crate::streaming::collaborators::{ApplicationRender, PropsFuture, RenderCollaborators};
use crate::streaming::error::RenderError;
use crate::streaming::merge::Source;

/// Largest JSON document accepted from an upstream.
const MAX_JSON_BYTES: usize = 1024 * 1024;

type HttpClient = Client<HttpConnector, Body>;

pub struct UpstreamCollaborators {
    client: HttpClient,
    applications: BTreeMap<String, Url>,
    fragments: BTreeMap<String, FragmentSource>,
    props_url: Option<Url>,
    timeout: Duration,
}

impl UpstreamCollaborators {
    /// Build from a validated configuration. URLs that fail to parse are
    /// skipped with a warning.
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let applications = config
            .applications
            .iter()
            .filter_map(|(name, url)| match Url::parse(url) {
                Ok(url) => Some((name.clone(), url)),
                Err(e) => {
                    tracing::warn!(app = %name, error = %e, "Skipping application with invalid URL");
                    None
                }
            })
            .collect();

        Self {
            client,
            applications,
            fragments: config.fragments.clone(),
            props_url: config.props.url.as_deref().and_then(|u| Url::parse(u).ok()),
            timeout: Duration::from_secs(config.timeouts.upstream_secs),
        }
    }

    fn fetcher(&self, node: String) -> Fetcher {
        Fetcher {
            client: self.client.clone(),
            timeout: self.timeout,
            node,
        }
    }

    fn app_url(&self, app_name: &str) -> Result<&Url, RenderError> {
        self.applications
            .get(app_name)
            .ok_or_else(|| RenderError::collaborator(app_name, "no upstream configured"))
    }
}

/// `{base}/{segment}` regardless of a trailing slash on `base`.
fn endpoint(base: &Url, segment: &str) -> Result<Url, RenderError> {
    let joined = format!("{}/{segment}", base.as_str().trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| RenderError::collaborator(segment, e))
}

/// One upstream call site, carrying what is needed to outlive the walk.
struct Fetcher {
    client: HttpClient,
    timeout: Duration,
    node: String,
}

impl Fetcher {
    async fn get(&self, url: Url) -> Result<hyper::Response<hyper::body::Incoming>, RenderError> {
        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|e| RenderError::collaborator(self.node.clone(), e))?;
        let request = Request::get(uri)
            .body(Body::empty())
            .map_err(|e| RenderError::collaborator(self.node.clone(), e))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| RenderError::Timeout {
                node: self.node.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| RenderError::collaborator(self.node.clone(), e))?;

        if !response.status().is_success() {
            return Err(RenderError::collaborator(
                self.node.clone(),
                format!("upstream answered {}", response.status()),
            ));
        }
        tracing::debug!(node = %self.node, url = %url, "Upstream responded");
        Ok(response)
    }

    /// Stream the response body as content.
    async fn stream(self, url: Url) -> Result<Source, RenderError> {
        let response = self.get(url).await?;
        let node = self.node;
        let body = Body::new(response.into_body())
            .into_data_stream()
            .map(move |chunk| chunk.map_err(|e| RenderError::collaborator(node.clone(), e)));
        Ok(Source::stream(body))
    }

    async fn json(self, url: Url) -> Result<Value, RenderError> {
        let response = self.get(url).await?;
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_JSON_BYTES)
            .await
            .map_err(|e| RenderError::collaborator(self.node.clone(), e))?;
        serde_json::from_slice(&bytes).map_err(|e| RenderError::collaborator(self.node, e))
    }
}

fn with_props(mut url: Url, props: &serde_json::Map<String, Value>) -> Url {
    url.query_pairs_mut()
        .append_pair("props", &Value::Object(props.clone()).to_string());
    url
}

fn to_header_map(node: &str, value: Value) -> Result<HeaderMap, RenderError> {
    let Value::Object(entries) = value else {
        return Err(RenderError::collaborator(node, "headers must be a JSON object"));
    };
    let mut headers = HeaderMap::new();
    for (name, value) in entries {
        let Value::String(value) = value else {
            tracing::warn!(app = %node, header = %name, "Ignoring non-string header value");
            continue;
        };
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(app = %node, header = %name, "Ignoring invalid header"),
        }
    }
    Ok(headers)
}

impl RenderCollaborators for UpstreamCollaborators {
    fn render_application(
        &self,
        app_name: &str,
        props: PropsFuture,
    ) -> Result<ApplicationRender, RenderError> {
        let render = endpoint(self.app_url(app_name)?, "render")?;
        let fetcher = self.fetcher(app_name.to_string());
        let content = Source::pending(async move {
            let props = props.await?;
            fetcher.stream(with_props(render, &props)).await
        });
        Ok(ApplicationRender::content(content))
    }

    fn render_fragment(&self, name: &str) -> Result<Source, RenderError> {
        match self.fragments.get(name) {
            Some(FragmentSource::Inline(markup)) => Ok(Source::from(markup.clone())),
            Some(FragmentSource::Url(url)) => {
                let url = Url::parse(url).map_err(|e| RenderError::collaborator(name, e))?;
                Ok(Source::pending(self.fetcher(format!("fragment:{name}")).stream(url)))
            }
            None => Err(RenderError::UnknownFragment(name.to_string())),
        }
    }

    fn retrieve_headers(
        &self,
        app_name: &str,
        props: PropsFuture,
    ) -> BoxFuture<'static, Result<HeaderMap, RenderError>> {
        let Some(base) = self.applications.get(app_name) else {
            return futures_util::future::ready(Ok(HeaderMap::new())).boxed();
        };
        let headers_url = endpoint(base, "headers");
        let fetcher = self.fetcher(app_name.to_string());
        async move {
            let props = props.await?;
            let node = fetcher.node.clone();
            let value = fetcher.json(with_props(headers_url?, &props)).await?;
            to_header_map(&node, value)
        }
        .boxed()
    }

    fn retrieve_prop(&self, prop_name: &str) -> BoxFuture<'static, Result<Value, RenderError>> {
        let url = match &self.props_url {
            Some(base) => endpoint(base, prop_name),
            None => Err(RenderError::collaborator(
                format!("prop:{prop_name}"),
                "no props upstream configured",
            )),
        };
        let fetcher = self.fetcher(format!("prop:{prop_name}"));
        async move { fetcher.json(url?).await }.boxed()
    }
}
