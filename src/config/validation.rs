//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and upstream URLs
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the config

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{FragmentSource, ServerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    if config.layout.path.trim().is_empty() {
        errors.push(ValidationError::new("layout.path", "must not be empty"));
    }
    let namespace = &config.layout.namespace;
    if namespace.is_empty() || namespace.chars().any(char::is_whitespace) {
        errors.push(ValidationError::new(
            "layout.namespace",
            "must be non-empty and contain no whitespace",
        ));
    }
    check_url(&mut errors, "layout.origin", &config.layout.origin);

    for (name, url) in &config.applications {
        check_url(&mut errors, &format!("applications.{name}"), url);
    }
    for (name, source) in &config.fragments {
        if let FragmentSource::Url(url) = source {
            check_url(&mut errors, &format!("fragments.{name}.url"), url);
        }
    }
    if let Some(url) = &config.props.url {
        check_url(&mut errors, "props.url", url);
    }

    for (field, secs) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme `{}`", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("`{value}` is not a URL: {e}"))),
    }
}
