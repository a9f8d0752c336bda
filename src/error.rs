//! Error taxonomy for loading, configuration and middleware failures.
//!
//! Startup errors ([`LoadError`], [`ConfigError`]) are fatal: a service should
//! refuse to start on a broken specification. Per-request errors
//! ([`MiddlewareError`]) are contained to the request that produced them.

use std::path::PathBuf;

use http::Method;

use crate::validator::{join_messages, ValidationError};

/// Errors raised while loading an OpenAPI document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The specification file could not be read.
    #[error("failed to read specification {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed JSON or YAML.
    #[error("failed to parse specification: {0}")]
    Parse(String),

    /// The `openapi` field is missing or not a 3.x version.
    #[error("unsupported OpenAPI version {0:?}: only 3.x documents are supported")]
    UnsupportedVersion(String),

    /// A `$ref` does not resolve to a component of the same document.
    #[error("unresolvable $ref {reference:?} at {pointer}")]
    SchemaRef { reference: String, pointer: String },

    /// A response key is neither a status code, an `nXX` range nor `default`.
    #[error("invalid status code {code:?} at {pointer}")]
    InvalidStatusCode { code: String, pointer: String },

    /// A path template is syntactically broken.
    #[error("invalid path template {template:?}: {reason}")]
    InvalidPathTemplate { template: String, reason: String },

    /// A schema uses a construct the validator cannot evaluate.
    #[error("invalid schema at {pointer}: {message}")]
    InvalidSchema { pointer: String, message: String },

    /// Two templates of equal specificity can match the same concrete path.
    #[error("path templates {first:?} and {second:?} are equally specific and overlap")]
    AmbiguousPaths { first: String, second: String },
}

/// Errors raised while reading middleware configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("missing required config key {0}")]
    MissingKey(&'static str),

    /// The configured specification failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors surfaced by the middleware when the raise policy is enabled.
#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("request validation failed for {method} {path}: {}", join_messages(.errors))]
    RequestInvalid {
        method: Method,
        path: String,
        errors: Vec<ValidationError>,
    },

    #[error("response validation failed for {method} {path}: {}", join_messages(.errors))]
    ResponseInvalid {
        method: Method,
        path: String,
        errors: Vec<ValidationError>,
    },
}

impl MiddlewareError {
    /// The validation errors carried by this failure.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            MiddlewareError::RequestInvalid { errors, .. }
            | MiddlewareError::ResponseInvalid { errors, .. } => errors,
        }
    }
}
