//! Path composition and activation predicates.
//!
//! # Design Decisions
//! - Segment matching only, no regex in the hot path
//! - Matching is case-insensitive; `:name` segments match any one segment
//! - The same join rule is used for nested route paths and request URLs

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

/// Join a path prefix and a path segment.
///
/// Exactly one slash separates the two halves and a trailing slash is
/// stripped unless the result is the root.
pub fn resolve_path(prefix: &str, path: &str) -> String {
    let mut result = match (prefix.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", prefix, &path[1..]),
        (false, false) => format!("{}/{}", prefix, path),
        _ => format!("{}{}", prefix, path),
    };
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    result
}

/// How the routed path is read from a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    History,
    Hash,
}

impl RoutingMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "history" => Some(Self::History),
            "hash" => Some(Self::Hash),
            _ => None,
        }
    }

    /// The path the routes are matched against.
    pub fn route_path(self, url: &Url) -> String {
        match self {
            RoutingMode::History => url.path().to_string(),
            RoutingMode::Hash => {
                let fragment = url.fragment().unwrap_or("");
                let fragment = fragment.split('?').next().unwrap_or("");
                resolve_path("/", fragment)
            }
        }
    }
}

/// A pure predicate from a URL to "is this active".
#[derive(Clone)]
pub struct ActiveWhen(Arc<dyn Fn(&Url) -> bool + Send + Sync>);

impl ActiveWhen {
    pub fn new(f: impl Fn(&Url) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Always active.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    pub fn test(&self, url: &Url) -> bool {
        (self.0)(url)
    }
}

impl fmt::Debug for ActiveWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActiveWhen(..)")
    }
}

/// Predicate active when the routed path matches `full_path`.
pub fn path_active_when(full_path: &str, exact: bool, mode: RoutingMode) -> ActiveWhen {
    let pattern = PathPattern::new(full_path, exact);
    ActiveWhen::new(move |url| pattern.matches(&mode.route_path(url)))
}

/// Predicate active when the routed path lies under `base`.
pub fn base_active_when(base: &str, mode: RoutingMode) -> ActiveWhen {
    let base = resolve_path("/", base);
    ActiveWhen::new(move |url| within_base(&base, &mode.route_path(url)))
}

/// Whether `path` is `base` itself or a path below it, compared by segment.
///
/// `base` must already be normalized with [`resolve_path`].
pub fn within_base(base: &str, path: &str) -> bool {
    if base == "/" {
        return true;
    }
    let path = path.as_bytes();
    let base = base.as_bytes();
    path.len() >= base.len()
        && path[..base.len()].eq_ignore_ascii_case(base)
        && matches!(path.get(base.len()), None | Some(b'/'))
}

/// A compiled route path.
#[derive(Debug, Clone)]
struct PathPattern {
    segments: Vec<Segment>,
    exact: bool,
}

#[derive(Debug, Clone)]
enum Segment {
    Static(String),
    Dynamic,
}

impl PathPattern {
    fn new(path: &str, exact: bool) -> Self {
        let segments = split_segments(path)
            .map(|s| {
                if s.starts_with(':') {
                    Segment::Dynamic
                } else {
                    Segment::Static(s.to_string())
                }
            })
            .collect();
        Self { segments, exact }
    }

    fn matches(&self, path: &str) -> bool {
        let actual: Vec<&str> = split_segments(path).collect();
        if actual.len() < self.segments.len() || (self.exact && actual.len() != self.segments.len()) {
            return false;
        }
        self.segments.iter().zip(&actual).all(|(seg, part)| match seg {
            Segment::Dynamic => true,
            Segment::Static(s) => s.eq_ignore_ascii_case(part),
        })
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(&format!("http://localhost{}", s)).unwrap()
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/a/", "b"), "/a/b");
        assert_eq!(resolve_path("/a", "/b"), "/a/b");
        assert_eq!(resolve_path("/a/", "/b"), "/a/b");
        assert_eq!(resolve_path("/a", "b"), "/a/b");
        assert_eq!(resolve_path("/a", "b/"), "/a/b");
        assert_eq!(resolve_path("/", "/"), "/");
        assert_eq!(resolve_path("/", ""), "/");
    }

    #[test]
    fn test_prefix_matching() {
        let p = path_active_when("/app1", false, RoutingMode::History);
        assert!(p.test(&url("/app1")));
        assert!(p.test(&url("/APP1/settings")));
        assert!(p.test(&url("/app1/?q=1")));
        assert!(!p.test(&url("/app10")));
        assert!(!p.test(&url("/")));
    }

    #[test]
    fn test_exact_matching() {
        let p = path_active_when("/users/:id", true, RoutingMode::History);
        assert!(p.test(&url("/users/42")));
        assert!(p.test(&url("/users/42/")));
        assert!(!p.test(&url("/users/42/edit")));
        assert!(!p.test(&url("/users")));

        let root = path_active_when("/", true, RoutingMode::History);
        assert!(root.test(&url("/")));
        assert!(!root.test(&url("/x")));
    }

    #[test]
    fn test_hash_mode() {
        let p = path_active_when("/app1", false, RoutingMode::Hash);
        assert!(p.test(&url("/#/app1")));
        assert!(p.test(&url("/#/app1?x=1")));
        assert!(!p.test(&url("/app1")));
    }

    #[test]
    fn test_base_predicate() {
        let p = base_active_when("/shop/", RoutingMode::History);
        assert!(p.test(&url("/shop/cart")));
        assert!(!p.test(&url("/blog")));
    }

    #[test]
    fn test_base_is_segment_prefix() {
        assert!(within_base("/shop", "/shop"));
        assert!(within_base("/shop", "/shop/"));
        assert!(within_base("/shop", "/Shop/cart"));
        assert!(!within_base("/shop", "/shopping"));
        assert!(!within_base("/shop", "/sho"));
        assert!(within_base("/", "/anything"));

        let p = base_active_when("/shop", RoutingMode::History);
        assert!(!p.test(&url("/shopping/cart")));
    }
}
