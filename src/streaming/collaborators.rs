//! External render collaborators.
//!
//! The renderer never produces application content itself. Everything that
//! comes from outside the layout is obtained through [`RenderCollaborators`].

use axum::http::HeaderMap;
use futures_util::future::{BoxFuture, Shared};
use serde_json::{Map, Value};

use crate::streaming::error::RenderError;
use crate::streaming::merge::Source;

/// Resolved props of one application.
pub type PropMap = Map<String, Value>;

/// Props of an application, resolved lazily and shareable between waiters.
pub type PropsFuture = Shared<BoxFuture<'static, Result<PropMap, RenderError>>>;

/// What the application collaborator returns for one placement.
pub struct ApplicationRender {
    /// Markup placed inside the application's container.
    pub content: Source,
    /// Markup placed at the document's assets slot.
    pub assets: Option<Source>,
    /// Extra props the application wants shipped to the client.
    pub props: Option<BoxFuture<'static, Result<PropMap, RenderError>>>,
}

impl ApplicationRender {
    pub fn content(content: impl Into<Source>) -> Self {
        Self {
            content: content.into(),
            assets: None,
            props: None,
        }
    }
}

/// Headers contributed by one application.
#[derive(Debug, Clone)]
pub struct AppHeaders {
    pub app_name: String,
    pub headers: HeaderMap,
}

/// Server-side collaborators invoked while walking the document.
///
/// Every method is called synchronously during the tree walk. Returned
/// futures are spawned straight away so production overlaps with draining.
pub trait RenderCollaborators: Send + Sync + 'static {
    /// Render an application's content, assets and extra props.
    fn render_application(
        &self,
        app_name: &str,
        props: PropsFuture,
    ) -> Result<ApplicationRender, RenderError>;

    /// Render a named fragment. Unknown names yield
    /// [`RenderError::UnknownFragment`].
    fn render_fragment(&self, name: &str) -> Result<Source, RenderError>;

    /// Headers an application wants set on the response.
    fn retrieve_headers(
        &self,
        app_name: &str,
        props: PropsFuture,
    ) -> BoxFuture<'static, Result<HeaderMap, RenderError>>;

    /// Fetch a prop that was not available at resolve time.
    fn retrieve_prop(&self, prop_name: &str) -> BoxFuture<'static, Result<Value, RenderError>>;

    /// Merge every application's headers into the response headers.
    ///
    /// Later applications in document order win.
    fn assemble_headers(&self, all: Vec<AppHeaders>) -> HeaderMap {
        let mut merged = HeaderMap::new();
        for app in all {
            for name in app.headers.keys() {
                merged.remove(name);
            }
            for (name, value) in app.headers.iter() {
                merged.append(name.clone(), value.clone());
            }
        }
        merged
    }
}
