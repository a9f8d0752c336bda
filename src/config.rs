//! # Configuration Module
//!
//! Startup configuration for the validation middleware. Values come from a
//! YAML file, from `OASGUARD_*` environment variables, or both (environment
//! wins). Configuration is read once; changing it requires building a new
//! middleware.
//!
//! ## File format
//!
//! ```yaml
//! schema_path: openapi.yaml
//! prefix: /api/v1
//! strict: false
//! max_depth: 64
//! check_content_type: true
//! coerce_params: true
//! request:
//!   enabled: true
//!   raise: false
//!   ignore_error: false
//! response:
//!   enabled: true
//!   raise: false
//!   ignore_error: false
//!   validate_success_only: true
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above
//! (`schema_path` and `prefix` default to unset).
//!
//! ## Environment Variables
//!
//! | Variable | Overrides |
//! |---|---|
//! | `OASGUARD_SCHEMA_PATH` | `schema_path` |
//! | `OASGUARD_PREFIX` | `prefix` |
//! | `OASGUARD_STRICT` | `strict` |
//! | `OASGUARD_MAX_DEPTH` | `max_depth` |
//! | `OASGUARD_RAISE` | `request.raise` and `response.raise` |
//! | `OASGUARD_IGNORE_ERROR` | `request.ignore_error` and `response.ignore_error` |
//! | `OASGUARD_VALIDATE_SUCCESS_ONLY` | `response.validate_success_only` |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;
use crate::spec::{load_spec, SpecDocument};
use crate::validator::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};

/// Policy for one direction (request or response).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestPolicy {
    pub enabled: bool,
    /// Surface failures as `Err` instead of rendering an error response
    pub raise: bool,
    /// Log failures but let the exchange continue unchanged
    pub ignore_error: bool,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            raise: false,
            ignore_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsePolicy {
    pub enabled: bool,
    pub raise: bool,
    pub ignore_error: bool,
    /// Only validate 2xx responses
    pub validate_success_only: bool,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            raise: false,
            ignore_error: false,
            validate_success_only: true,
        }
    }
}

/// Middleware configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub schema_path: Option<PathBuf>,
    /// Mount prefix; requests outside it are not documented
    pub prefix: Option<String>,
    /// Reject undocumented routes with 404 instead of passing them through
    pub strict: bool,
    pub max_depth: usize,
    pub check_content_type: bool,
    /// Coerce string parameters to the documented integer/number/boolean type
    pub coerce_params: bool,
    pub request: RequestPolicy,
    pub response: ResponsePolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            schema_path: None,
            prefix: None,
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
            check_content_type: true,
            coerce_params: true,
            request: RequestPolicy::default(),
            response: ResponsePolicy::default(),
        }
    }
}

impl ValidationConfig {
    /// Read a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Defaults overridden by `OASGUARD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Override fields from `OASGUARD_*` environment variables.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| env::var(name).ok())
    }

    /// Override fields from an arbitrary variable source.
    pub fn apply_vars(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup("OASGUARD_SCHEMA_PATH") {
            self.schema_path = Some(PathBuf::from(path));
        }
        if let Some(prefix) = lookup("OASGUARD_PREFIX") {
            self.prefix = Some(prefix);
        }
        if let Some(v) = lookup("OASGUARD_STRICT") {
            self.strict = parse_bool("OASGUARD_STRICT", &v)?;
        }
        if let Some(v) = lookup("OASGUARD_MAX_DEPTH") {
            self.max_depth = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "OASGUARD_MAX_DEPTH",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("OASGUARD_RAISE") {
            let raise = parse_bool("OASGUARD_RAISE", &v)?;
            self.request.raise = raise;
            self.response.raise = raise;
        }
        if let Some(v) = lookup("OASGUARD_IGNORE_ERROR") {
            let ignore = parse_bool("OASGUARD_IGNORE_ERROR", &v)?;
            self.request.ignore_error = ignore;
            self.response.ignore_error = ignore;
        }
        if let Some(v) = lookup("OASGUARD_VALIDATE_SUCCESS_ONLY") {
            self.response.validate_success_only =
                parse_bool("OASGUARD_VALIDATE_SUCCESS_ONLY", &v)?;
        }
        self.check()?;
        debug!(config = ?self, "Validation config resolved");
        Ok(self)
    }

    /// Load the document named by `schema_path`.
    pub fn load_document(&self) -> Result<SpecDocument, ConfigError> {
        let path = self
            .schema_path
            .as_ref()
            .ok_or(ConfigError::MissingKey("schema_path"))?;
        Ok(load_spec(path)?)
    }

    /// `max_depth` must lie in `1..=MAX_DEPTH_LIMIT`.
    fn check(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid {
                key: "max_depth",
                value: self.max_depth.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
