//! Configuration and layout loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{LayoutFile, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::layout::error::ConfigurationError;
use crate::layout::model::ResolvedDocument;
use crate::layout::resolver::{resolve_document, ResolveOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Layout file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Layout failed to resolve: {0}")]
    Layout(#[from] ConfigurationError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(&read(path)?)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load a layout file and resolve it for server rendering.
///
/// Props named in the layout but absent from its data are deferred and
/// fetched per request.
pub fn load_layout(path: &Path, strict: bool) -> Result<ResolvedDocument, ConfigError> {
    let file: LayoutFile = serde_json::from_str(&read(path)?)?;
    let options = ResolveOptions {
        strict,
        defer_missing_props: true,
    };
    let document = resolve_document(&file.document, &file.data, &options)?;
    tracing::info!(
        path = %path.display(),
        applications = document.routes.application_names().len(),
        redirects = document.routes.redirects.len(),
        "Layout loaded"
    );
    Ok(document)
}
