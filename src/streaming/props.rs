//! Per-request prop memoization.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use crate::streaming::collaborators::RenderCollaborators;
use crate::streaming::error::RenderError;

type SharedProp = Shared<BoxFuture<'static, Result<Value, RenderError>>>;

/// Deferred props fetched at most once per name within one request.
#[derive(Clone)]
pub struct PropCache {
    collaborators: Arc<dyn RenderCollaborators>,
    entries: Arc<DashMap<String, SharedProp>>,
    /// Names in first-request order, for the data island.
    order: Arc<std::sync::Mutex<Vec<String>>>,
}

impl PropCache {
    pub fn new(collaborators: Arc<dyn RenderCollaborators>) -> Self {
        Self {
            collaborators,
            entries: Arc::new(DashMap::new()),
            order: Arc::default(),
        }
    }

    /// The pending value of a prop, starting retrieval on first use.
    pub fn get(&self, name: &str) -> SharedProp {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(prop = %name, "Retrieving deferred prop");
                self.order
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(name.to_string());
                self.collaborators.retrieve_prop(name).shared()
            })
            .value()
            .clone()
    }

    /// Names retrieved so far.
    pub fn names(&self) -> Vec<String> {
        self.order
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
