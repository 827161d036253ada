//! Layout file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_layout;
use crate::layout::model::ResolvedDocument;
use crate::observability::metrics;

/// Re-resolves the layout file on change and swaps it into `target`.
pub struct LayoutWatcher {
    path: PathBuf,
    strict: bool,
    target: Arc<ArcSwap<ResolvedDocument>>,
}

impl LayoutWatcher {
    pub fn new(path: &Path, strict: bool, target: Arc<ArcSwap<ResolvedDocument>>) -> Self {
        Self {
            path: path.to_path_buf(),
            strict,
            target,
        }
    }

    /// Load the file once and publish it if it resolves.
    pub fn reload(&self) -> bool {
        match load_layout(&self.path, self.strict) {
            Ok(document) => {
                self.target.store(Arc::new(document));
                metrics::record_config_reload(true);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload layout. Keeping current layout.");
                metrics::record_config_reload(false);
                false
            }
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// Watching stops when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Layout file change detected, reloading...");
                        self.reload();
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Layout watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::layout::{InputNode, LayoutData};
    use crate::layout::resolver::{resolve_document, ResolveOptions};

    fn layout_json(app: &str) -> String {
        format!(
            r#"{{"document": [{{"kind": "element", "tag": "single-spa-router", "children": [
                {{"kind": "element", "tag": "application", "attrs": [{{"name": "name", "value": "{app}"}}]}}
            ]}}]}}"#
        )
    }

    #[test]
    fn test_reload_swaps_and_keeps_previous_on_error() {
        let empty = resolve_document(
            &[InputNode::element("single-spa-router", &[], vec![])],
            &LayoutData::default(),
            &ResolveOptions::default(),
        )
        .unwrap();
        let target = Arc::new(ArcSwap::from_pointee(empty));
        let path = std::env::temp_dir().join(format!("spa-layout-watch-{}.json", uuid::Uuid::new_v4()));
        let watcher = LayoutWatcher::new(&path, false, target.clone());

        fs::write(&path, layout_json("nav")).unwrap();
        assert!(watcher.reload());
        assert_eq!(target.load().routes.application_names(), vec!["nav"]);

        fs::write(&path, "{ not json").unwrap();
        assert!(!watcher.reload());
        assert_eq!(target.load().routes.application_names(), vec!["nav"]);

        fs::remove_file(path).unwrap();
    }
}
