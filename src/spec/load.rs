use super::build::build_document;
use super::types::SpecDocument;
use crate::error::LoadError;
use crate::router::check_ambiguity;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Source format of a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
    /// Try JSON first, then YAML
    Auto,
}

impl SpecFormat {
    /// Pick the format from a file extension (`.yaml`/`.yml` or `.json`).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => SpecFormat::Yaml,
            Some("json") => SpecFormat::Json,
            _ => SpecFormat::Auto,
        }
    }
}

/// Load and fully resolve an OpenAPI 3.x document from disk.
///
/// Every `$ref`, status key and path template is checked here, so lookups
/// against the returned document cannot fail later.
pub fn load_spec(path: impl AsRef<Path>) -> Result<SpecDocument, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "Specification read");
    load_spec_from_str(&content, SpecFormat::from_path(path))
}

/// Load a document from an in-memory string.
pub fn load_spec_from_str(content: &str, format: SpecFormat) -> Result<SpecDocument, LoadError> {
    let value = parse_document(content, format)?;
    let doc = build_document(&value, fingerprint(content.as_bytes()))?;
    check_ambiguity(doc.paths.keys().map(String::as_str))?;

    info!(
        title = %doc.title(),
        openapi = %doc.openapi_version(),
        paths = doc.paths().len(),
        operations = doc.operations().count(),
        component_schemas = doc.components.len(),
        schema_nodes = doc.schema_count(),
        fingerprint = %doc.fingerprint(),
        "Specification loaded"
    );
    Ok(doc)
}

fn parse_document(content: &str, format: SpecFormat) -> Result<Value, LoadError> {
    match format {
        SpecFormat::Json => {
            serde_json::from_str(content).map_err(|e| LoadError::Parse(format!("JSON: {e}")))
        }
        SpecFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(content)
                .map_err(|e| LoadError::Parse(format!("YAML: {e}")))?;
            yaml_to_json(yaml)
        }
        SpecFormat::Auto => match serde_json::from_str(content) {
            Ok(v) => Ok(v),
            Err(_) => parse_document(content, SpecFormat::Yaml),
        },
    }
}

/// Convert YAML into JSON, stringifying scalar mapping keys such as an
/// unquoted `200:` response code.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, LoadError> {
    use serde_yaml::Value as Y;
    Ok(match value {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| LoadError::Parse(format!("YAML: unrepresentable number {n}")))?
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Y::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                let key = match k {
                    Y::String(s) => s,
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    other => {
                        return Err(LoadError::Parse(format!(
                            "YAML: unsupported mapping key {other:?}"
                        )))
                    }
                };
                map.insert(key, yaml_to_json(v)?);
            }
            Value::Object(map)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest
        .as_slice()
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}
