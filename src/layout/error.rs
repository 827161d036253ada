//! Layout error types.

use thiserror::Error;

/// Errors raised while resolving an input tree.
///
/// Every variant carries the property path of the offending node,
/// e.g. `routesConfig.routes[2].path`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A node of the wrong kind appeared where routing nodes were expected.
    #[error("{path}: {message}")]
    InvalidNode { path: String, message: String },

    /// A required attribute was absent or empty.
    #[error("{path}: missing required attribute `{attribute}`")]
    MissingAttribute { path: String, attribute: String },

    /// A property that strict mode does not recognise.
    #[error("{path}: unknown property `{property}`")]
    UnknownProperty { path: String, property: String },

    /// A value bound by name was not present in the layout data.
    #[error("{path}: `{name}` was not found in layoutData.{table}")]
    MissingLayoutData {
        path: String,
        table: &'static str,
        name: String,
    },

    /// The input tree had no router element.
    #[error("no <single-spa-router> element found in layout document")]
    NoRouter,

    /// A route's activation could not be computed.
    #[error(transparent)]
    Activation(#[from] ActivationError),
}

/// Errors in how a route declares its activation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// A route with neither `path` nor `default`.
    #[error("{path}: route must have either a path or be a default route")]
    NoActivation { path: String },

    /// A route with both `path` and `default`.
    #[error("{path}: a route cannot have both a path and default=true")]
    PathAndDefault { path: String },
}
