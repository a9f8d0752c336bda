use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::trace;

use super::error::{ValidationError, ValidationErrorKind};
use crate::spec::{escape_token, Schema, SchemaId, SchemaKind, SpecDocument};

/// Default bound on property/item descents plus `$ref` hops.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Hard ceiling for the depth bound. The walk recurses on the native stack.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// Validates JSON instances against schemas of one [`SpecDocument`].
///
/// Cheap to construct; holds no per-call state, so one validator can be
/// shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'d> {
    doc: &'d SpecDocument,
    max_depth: usize,
}

impl<'d> SchemaValidator<'d> {
    #[must_use]
    pub fn new(doc: &'d SpecDocument) -> Self {
        Self {
            doc,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the depth bound, clamped to [`MAX_DEPTH_LIMIT`].
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validate `instance` against schema `id`, collecting every error.
    ///
    /// An empty result means the instance is valid.
    #[must_use]
    pub fn validate(&self, id: SchemaId, instance: &Value) -> Vec<ValidationError> {
        let mut walk = Walk {
            doc: self.doc,
            max_depth: self.max_depth,
            resolved: HashMap::new(),
            inline: Vec::new(),
            reported: HashSet::new(),
            errors: Vec::new(),
        };
        let mut path = String::new();
        walk.visit(id, instance, &mut path, 0);
        trace!(
            schema = id.index(),
            errors = walk.errors.len(),
            refs_resolved = walk.resolved.len(),
            "Instance validated"
        );
        walk.errors
    }
}

/// Validate with the default depth bound.
#[must_use]
pub fn validate(doc: &SpecDocument, id: SchemaId, instance: &Value) -> Vec<ValidationError> {
    SchemaValidator::new(doc).validate(id, instance)
}

/// JSON type name of an instance as used in mismatch messages.
#[must_use]
pub fn json_type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integral(instance: &Value) -> bool {
    match instance {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// State of one `validate` call.
struct Walk<'d> {
    doc: &'d SpecDocument,
    max_depth: usize,
    /// Component name → id, filled on first use
    resolved: HashMap<&'d str, Option<SchemaId>>,
    /// Schemas entered at the current instance position (`$ref` and `allOf` hops)
    inline: Vec<SchemaId>,
    /// Cycles already reported, by schema and instance path
    reported: HashSet<(SchemaId, String)>,
    errors: Vec<ValidationError>,
}

impl<'d> Walk<'d> {
    fn visit(&mut self, id: SchemaId, instance: &Value, path: &mut String, depth: usize) {
        let doc = self.doc;
        let Some(schema) = doc.schema(id) else {
            return;
        };

        if depth > self.max_depth {
            self.errors.push(ValidationError::new(
                ValidationErrorKind::SchemaTooDeep,
                schema.pointer.as_str(),
                path.as_str(),
                format!("schema nesting exceeds maximum depth of {}", self.max_depth),
            ));
            return;
        }

        if self.inline.contains(&id) {
            if self.reported.insert((id, path.clone())) {
                self.errors.push(ValidationError::new(
                    ValidationErrorKind::SchemaTooDeep,
                    schema.pointer.as_str(),
                    path.as_str(),
                    "schema refers back to itself without descending into the instance",
                ));
            }
            return;
        }

        self.inline.push(id);
        self.check(schema, instance, path, depth);
        self.inline.pop();
    }

    /// Visit a property or item; hops above this position no longer count as cycles.
    fn descend(&mut self, id: SchemaId, instance: &Value, path: &mut String, depth: usize) {
        let outer = std::mem::take(&mut self.inline);
        self.visit(id, instance, path, depth);
        self.inline = outer;
    }

    fn check(&mut self, schema: &'d Schema, instance: &Value, path: &mut String, depth: usize) {
        if let SchemaKind::Ref(name) = &schema.kind {
            let doc = self.doc;
            let target = *self
                .resolved
                .entry(name.as_str())
                .or_insert_with(|| doc.component(name));
            if let Some(target) = target {
                self.visit(target, instance, path, depth + 1);
            }
            return;
        }

        let unconstrained = schema.kind == SchemaKind::Any && schema.all_of.is_empty();
        if instance.is_null() && (schema.nullable || unconstrained) {
            return;
        }

        let type_ok = match &schema.kind {
            SchemaKind::Object { .. } => instance.is_object(),
            SchemaKind::Array { .. } => instance.is_array(),
            SchemaKind::String => instance.is_string(),
            SchemaKind::Number => instance.is_number(),
            SchemaKind::Integer => is_integral(instance),
            SchemaKind::Boolean => instance.is_boolean(),
            SchemaKind::Any | SchemaKind::Ref(_) => true,
        };
        if !type_ok {
            self.errors.push(ValidationError::new(
                ValidationErrorKind::TypeMismatch,
                schema.pointer.as_str(),
                path.as_str(),
                format!(
                    "expected {}, but received {}",
                    schema.kind.type_name(),
                    json_type_name(instance)
                ),
            ));
            return;
        }

        if let Some(allowed) = &schema.enumeration {
            if !allowed.contains(instance) {
                let listed = allowed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.errors.push(ValidationError::new(
                    ValidationErrorKind::EnumMismatch,
                    schema.pointer.as_str(),
                    path.as_str(),
                    format!("{instance} is not one of [{listed}]"),
                ));
            }
        }

        match (&schema.kind, instance) {
            (SchemaKind::Object { properties, required }, Value::Object(map)) => {
                let missing: Vec<&str> = required
                    .iter()
                    .filter(|name| !map.contains_key(name.as_str()))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    self.errors.push(ValidationError::new(
                        ValidationErrorKind::MissingRequired,
                        schema.pointer.as_str(),
                        path.as_str(),
                        format!("missing required parameters: {}", missing.join(", ")),
                    ));
                }
                for (name, child) in properties {
                    if let Some(value) = map.get(name) {
                        let len = path.len();
                        path.push('/');
                        path.push_str(&escape_token(name));
                        self.descend(*child, value, path, depth + 1);
                        path.truncate(len);
                    }
                }
            }
            (SchemaKind::Array { items: Some(items) }, Value::Array(elements)) => {
                for (i, element) in elements.iter().enumerate() {
                    let len = path.len();
                    path.push('/');
                    path.push_str(&i.to_string());
                    self.descend(*items, element, path, depth + 1);
                    path.truncate(len);
                }
            }
            _ => {}
        }

        for member in &schema.all_of {
            self.visit(*member, instance, path, depth + 1);
        }
    }
}
