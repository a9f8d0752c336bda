use http::Method;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Index of a [`Schema`] node inside a [`SpecDocument`]'s schema arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(pub(crate) u32);

impl SchemaId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural kind of a schema node.
///
/// `Ref` nodes name a component schema instead of embedding it, so recursive
/// component graphs stay finite.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object {
        properties: BTreeMap<String, SchemaId>,
        required: Vec<String>,
    },
    Array {
        items: Option<SchemaId>,
    },
    String,
    Number,
    Integer,
    Boolean,
    /// No type constraint (`{}` or a schema with only annotations)
    Any,
    Ref(String),
}

impl SchemaKind {
    /// Name used in type-mismatch messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Any => "any",
            SchemaKind::Ref(_) => "$ref",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    /// JSON pointer of this schema inside the source document
    pub pointer: String,
    pub nullable: bool,
    pub enumeration: Option<Vec<Value>>,
    /// `allOf` members; the instance must also satisfy each of them
    pub all_of: Vec<SchemaId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

impl ParameterLocation {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<SchemaId>,
    pub pointer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub required: bool,
    /// Declared media types, in document order
    pub content_types: Vec<String>,
    /// Schema of the JSON media type, if one is declared
    pub schema: Option<SchemaId>,
    pub pointer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub content_type: Option<String>,
    pub schema: Option<SchemaId>,
    pub pointer: String,
}

/// Key of an entry in an operation's `responses` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKey {
    Code(u16),
    /// `"2XX"` style range, holding the leading digit
    Range(u8),
    Default,
}

impl StatusKey {
    /// Parse a response key; `None` if it is not a valid HTTP status key.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case("default") {
            return Some(StatusKey::Default);
        }
        let bytes = key.as_bytes();
        if bytes.len() == 3 && bytes[1..].eq_ignore_ascii_case(b"xx") {
            return match bytes[0] {
                d @ b'1'..=b'5' => Some(StatusKey::Range(d - b'0')),
                _ => None,
            };
        }
        match key.parse::<u16>() {
            Ok(code) if (100..=599).contains(&code) => Some(StatusKey::Code(code)),
            _ => None,
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKey::Code(c) => write!(f, "{c}"),
            StatusKey::Range(d) => write!(f, "{d}XX"),
            StatusKey::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub method: Method,
    pub path_template: Arc<str>,
    pub operation_id: Option<String>,
    pub pointer: String,
    pub parameters: Vec<ParameterMeta>,
    pub request_body: Option<RequestBody>,
    pub responses: HashMap<StatusKey, ResponseSpec>,
}

impl Operation {
    /// Response documented for `status`: exact code first, then `nXX`, then `default`.
    #[must_use]
    pub fn response_for(&self, status: u16) -> Option<&ResponseSpec> {
        self.responses
            .get(&StatusKey::Code(status))
            .or_else(|| {
                u8::try_from(status / 100)
                    .ok()
                    .and_then(|d| self.responses.get(&StatusKey::Range(d)))
            })
            .or_else(|| self.responses.get(&StatusKey::Default))
    }

    /// Label used in logs: the operationId when present, else `METHOD template`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.operation_id {
            Some(id) => id.clone(),
            None => format!("{} {}", self.method, self.path_template),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathItem {
    pub operations: HashMap<Method, Arc<Operation>>,
}

impl PathItem {
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&Arc<Operation>> {
        self.operations.get(method)
    }
}

/// A loaded, fully resolved OpenAPI document.
///
/// Built only by the loader; read-only afterwards. Share it as
/// `Arc<SpecDocument>` across threads.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    pub(crate) openapi: String,
    pub(crate) title: String,
    pub(crate) api_version: String,
    pub(crate) paths: BTreeMap<String, PathItem>,
    pub(crate) components: HashMap<String, SchemaId>,
    pub(crate) arena: Vec<Schema>,
    pub(crate) fingerprint: String,
}

impl SpecDocument {
    /// The `openapi` version string, e.g. `3.0.3`.
    #[must_use]
    pub fn openapi_version(&self) -> &str {
        &self.openapi
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// First 16 hex characters of the SHA-256 of the source bytes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn paths(&self) -> &BTreeMap<String, PathItem> {
        &self.paths
    }

    #[must_use]
    pub fn path_item(&self, template: &str) -> Option<&PathItem> {
        self.paths.get(template)
    }

    /// Iterate all operations in template order.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<Operation>> {
        self.paths.values().flat_map(|item| item.operations.values())
    }

    #[must_use]
    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        self.arena.get(id.index())
    }

    /// Follow `$ref` nodes from `id` to the first concrete schema.
    ///
    /// Returns `None` for a reference cycle that never reaches one.
    #[must_use]
    pub fn resolve(&self, id: SchemaId) -> Option<&Schema> {
        let mut current = self.schema(id)?;
        for _ in 0..=self.components.len() {
            match &current.kind {
                SchemaKind::Ref(name) => current = self.schema(self.component(name)?)?,
                _ => return Some(current),
            }
        }
        None
    }

    /// Look up a component schema (`#/components/schemas/<name>`).
    #[must_use]
    pub fn component(&self, name: &str) -> Option<SchemaId> {
        self.components.get(name).copied()
    }

    /// Names of all component schemas, sorted.
    #[must_use]
    pub fn component_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.arena.len()
    }
}
