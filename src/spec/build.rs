use super::types::{
    Operation, ParameterLocation, ParameterMeta, PathItem, RequestBody, ResponseSpec, Schema,
    SchemaId, SchemaKind, SpecDocument, StatusKey,
};
use crate::error::LoadError;
use crate::router::parse_template;
use http::Method;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

const METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Upper bound on `$ref` chains between parameter/body/response components
const MAX_COMPONENT_REF_HOPS: usize = 16;

/// Escape a JSON pointer reference token (RFC 6901).
#[must_use]
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverse of [`escape_token`].
#[must_use]
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Component schema name of a `#/components/schemas/<name>` reference.
#[must_use]
pub fn schema_ref_name(reference: &str) -> Option<String> {
    reference
        .strip_prefix(SCHEMA_REF_PREFIX)
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .map(unescape_token)
}

/// Pick the JSON media type out of a `content` map.
///
/// `application/json` wins; otherwise the first `*/json` or `*+json` type.
pub(crate) fn json_media(content: &Map<String, Value>) -> Option<(&str, &Value)> {
    if let Some((k, v)) = content.get_key_value("application/json") {
        return Some((k.as_str(), v));
    }
    content
        .iter()
        .find(|(k, _)| is_json_media_type(k))
        .map(|(k, v)| (k.as_str(), v))
}

/// `true` for `application/json`, `*/json`, `*+json`, with or without parameters.
#[must_use]
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.ends_with("/json") || essence.ends_with("+json")
}

/// Reject anything that is not an OpenAPI 3.x document.
pub(crate) fn check_version(root: &Value) -> Result<String, LoadError> {
    match root.get("openapi") {
        Some(Value::String(v)) if v.starts_with("3.") => Ok(v.clone()),
        Some(Value::String(v)) => Err(LoadError::UnsupportedVersion(v.clone())),
        // unquoted `openapi: 3.1` in YAML arrives as a float
        Some(Value::Number(n)) if n.to_string().starts_with("3.") => Ok(n.to_string()),
        Some(other) => Err(LoadError::UnsupportedVersion(other.to_string())),
        None => match root.get("swagger") {
            Some(v) => Err(LoadError::UnsupportedVersion(
                v.as_str().map_or_else(|| v.to_string(), str::to_string),
            )),
            None => Err(LoadError::UnsupportedVersion("<missing>".to_string())),
        },
    }
}

/// Build a [`SpecDocument`] from a parsed OpenAPI value.
///
/// Schemas go into a flat arena; `$ref` nodes keep the component name and
/// are checked against the component table before returning.
pub(crate) fn build_document(root: &Value, fingerprint: String) -> Result<SpecDocument, LoadError> {
    let openapi = check_version(root)?;
    let info = root.get("info");
    let title = info
        .and_then(|i| i.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let api_version = info
        .and_then(|i| i.get("version"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut builder = DocumentBuilder::new(root);

    let mut components = HashMap::new();
    if let Some(schemas) = root
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
    {
        for (name, value) in schemas {
            let pointer = format!("{SCHEMA_REF_PREFIX}{}", escape_token(name));
            let id = builder.build_schema(value, pointer)?;
            components.insert(name.clone(), id);
        }
    }

    let mut paths = BTreeMap::new();
    if let Some(path_map) = root.get("paths").and_then(Value::as_object) {
        for (template, item) in path_map {
            parse_template(template)?;
            let item_pointer = format!("#/paths/{}", escape_token(template));
            let path_item = builder.build_path_item(template, item, &item_pointer)?;
            paths.insert(template.clone(), path_item);
        }
    }

    for (name, pointer) in &builder.refs {
        if !components.contains_key(name) {
            return Err(LoadError::SchemaRef {
                reference: format!("{SCHEMA_REF_PREFIX}{}", escape_token(name)),
                pointer: pointer.clone(),
            });
        }
    }

    Ok(SpecDocument {
        openapi,
        title,
        api_version,
        paths,
        components,
        arena: builder.arena,
        fingerprint,
    })
}

struct DocumentBuilder<'a> {
    root: &'a Value,
    arena: Vec<Schema>,
    /// Every schema `$ref` seen, with the pointer of the referring node
    refs: Vec<(String, String)>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            arena: Vec::new(),
            refs: Vec::new(),
        }
    }

    fn push(&mut self, schema: Schema) -> Result<SchemaId, LoadError> {
        let idx = u32::try_from(self.arena.len()).map_err(|_| LoadError::InvalidSchema {
            pointer: schema.pointer.clone(),
            message: "too many schema nodes".to_string(),
        })?;
        self.arena.push(schema);
        Ok(SchemaId(idx))
    }

    fn build_schema(&mut self, value: &Value, pointer: String) -> Result<SchemaId, LoadError> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Bool(true) => {
                return self.push(Schema {
                    kind: SchemaKind::Any,
                    pointer,
                    nullable: true,
                    enumeration: None,
                    all_of: Vec::new(),
                })
            }
            other => {
                return Err(LoadError::InvalidSchema {
                    pointer,
                    message: format!("expected a schema object, found {other}"),
                })
            }
        };

        if let Some(reference) = obj.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| LoadError::InvalidSchema {
                pointer: pointer.clone(),
                message: "$ref must be a string".to_string(),
            })?;
            let name = schema_ref_name(reference).ok_or_else(|| LoadError::SchemaRef {
                reference: reference.to_string(),
                pointer: pointer.clone(),
            })?;
            self.refs.push((name.clone(), pointer.clone()));
            return self.push(Schema {
                kind: SchemaKind::Ref(name),
                pointer,
                nullable: false,
                enumeration: None,
                all_of: Vec::new(),
            });
        }

        let mut nullable = obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);
        let type_name = match obj.get("type") {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Array(types)) => {
                let mut concrete = Vec::with_capacity(types.len());
                for t in types {
                    match t.as_str() {
                        Some("null") => nullable = true,
                        Some(name) => concrete.push(name),
                        None => {
                            return Err(LoadError::InvalidSchema {
                                pointer,
                                message: "type list entries must be strings".to_string(),
                            })
                        }
                    }
                }
                match concrete.as_slice() {
                    [] => None,
                    [single] => Some(*single),
                    _ => {
                        return Err(LoadError::InvalidSchema {
                            pointer,
                            message: format!("multiple types {concrete:?} are not supported"),
                        })
                    }
                }
            }
            Some(other) => {
                return Err(LoadError::InvalidSchema {
                    pointer,
                    message: format!("type must be a string, found {other}"),
                })
            }
        };

        let kind = match type_name {
            Some("object") => self.build_object(obj, &pointer)?,
            Some("array") => self.build_array(obj, &pointer)?,
            Some("string") => SchemaKind::String,
            Some("number") => SchemaKind::Number,
            Some("integer") => SchemaKind::Integer,
            Some("boolean") => SchemaKind::Boolean,
            Some(other) => {
                return Err(LoadError::InvalidSchema {
                    pointer,
                    message: format!("unsupported type {other:?}"),
                })
            }
            None if obj.contains_key("properties") || obj.contains_key("required") => {
                self.build_object(obj, &pointer)?
            }
            None if obj.contains_key("items") => self.build_array(obj, &pointer)?,
            None => SchemaKind::Any,
        };

        let all_of = if obj.contains_key("allOf") {
            self.build_all_of(obj, &pointer)?
        } else {
            Vec::new()
        };
        if obj.contains_key("oneOf") || obj.contains_key("anyOf") {
            warn!(pointer = %pointer, "oneOf/anyOf are not evaluated; remaining keywords still apply");
        }

        let enumeration = obj.get("enum").and_then(Value::as_array).cloned();
        self.push(Schema {
            kind,
            pointer,
            nullable,
            enumeration,
            all_of,
        })
    }

    fn build_object(
        &mut self,
        obj: &Map<String, Value>,
        pointer: &str,
    ) -> Result<SchemaKind, LoadError> {
        let mut properties = BTreeMap::new();
        if let Some(props) = obj.get("properties") {
            let props = props.as_object().ok_or_else(|| LoadError::InvalidSchema {
                pointer: pointer.to_string(),
                message: "properties must be an object".to_string(),
            })?;
            for (name, prop) in props {
                let child = format!("{pointer}/properties/{}", escape_token(name));
                let id = self.build_schema(prop, child)?;
                properties.insert(name.clone(), id);
            }
        }
        let required = match obj.get("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => names
                .iter()
                .map(|n| {
                    n.as_str().map(str::to_string).ok_or_else(|| LoadError::InvalidSchema {
                        pointer: pointer.to_string(),
                        message: "required entries must be strings".to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            // OAS 2 style `required: true` on a property is meaningless here
            Some(Value::Bool(_)) => Vec::new(),
            Some(_) => {
                return Err(LoadError::InvalidSchema {
                    pointer: pointer.to_string(),
                    message: "required must be an array of property names".to_string(),
                })
            }
        };
        Ok(SchemaKind::Object {
            properties,
            required,
        })
    }

    fn build_array(
        &mut self,
        obj: &Map<String, Value>,
        pointer: &str,
    ) -> Result<SchemaKind, LoadError> {
        let items = match obj.get("items") {
            Some(items) => Some(self.build_schema(items, format!("{pointer}/items"))?),
            None => None,
        };
        Ok(SchemaKind::Array { items })
    }

    fn build_all_of(
        &mut self,
        obj: &Map<String, Value>,
        pointer: &str,
    ) -> Result<Vec<SchemaId>, LoadError> {
        let parts = obj
            .get("allOf")
            .and_then(Value::as_array)
            .ok_or_else(|| LoadError::InvalidSchema {
                pointer: pointer.to_string(),
                message: "allOf must be an array".to_string(),
            })?;
        let mut members = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            members.push(self.build_schema(part, format!("{pointer}/allOf/{i}"))?);
        }
        Ok(members)
    }

    /// Follow `$ref` for parameter, request body and response components.
    fn resolve_component<'v>(
        &self,
        value: &'v Value,
        pointer: &str,
        section: &str,
    ) -> Result<(&'v Value, String), LoadError>
    where
        'a: 'v,
    {
        let prefix = format!("#/components/{section}/");
        let mut current = value;
        let mut current_pointer = pointer.to_string();
        for _ in 0..MAX_COMPONENT_REF_HOPS {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return Ok((current, current_pointer));
            };
            let target = reference
                .strip_prefix(&prefix)
                .map(unescape_token)
                .and_then(|name| {
                    self.root
                        .get("components")
                        .and_then(|c| c.get(section))
                        .and_then(|s| s.get(&name))
                });
            match target {
                Some(t) => {
                    current = t;
                    current_pointer = reference.to_string();
                }
                None => {
                    return Err(LoadError::SchemaRef {
                        reference: reference.to_string(),
                        pointer: current_pointer,
                    })
                }
            }
        }
        Err(LoadError::SchemaRef {
            reference: pointer.to_string(),
            pointer: current_pointer,
        })
    }

    fn build_path_item(
        &mut self,
        template: &str,
        item: &Value,
        item_pointer: &str,
    ) -> Result<PathItem, LoadError> {
        let Some(obj) = item.as_object() else {
            return Err(LoadError::InvalidSchema {
                pointer: item_pointer.to_string(),
                message: "path item must be an object".to_string(),
            });
        };

        let shared = match obj.get("parameters") {
            Some(params) => {
                self.build_parameters(params, &format!("{item_pointer}/parameters"))?
            }
            None => Vec::new(),
        };

        let template: Arc<str> = Arc::from(template);
        let mut path_item = PathItem::default();
        for (key, op_value) in obj {
            let verb = key.to_ascii_lowercase();
            if !METHODS.contains(&verb.as_str()) {
                // summary, description, servers, x-* and unknown keys carry no validation data
                continue;
            }
            let method = Method::from_bytes(verb.to_ascii_uppercase().as_bytes()).map_err(|_| {
                LoadError::InvalidSchema {
                    pointer: item_pointer.to_string(),
                    message: format!("invalid method {key:?}"),
                }
            })?;
            let op_pointer = format!("{item_pointer}/{key}");
            let operation =
                self.build_operation(Arc::clone(&template), method.clone(), op_value, op_pointer, &shared)?;
            path_item.operations.insert(method, Arc::new(operation));
        }
        Ok(path_item)
    }

    fn build_operation(
        &mut self,
        template: Arc<str>,
        method: Method,
        value: &Value,
        pointer: String,
        shared: &[ParameterMeta],
    ) -> Result<Operation, LoadError> {
        let operation_id = value
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut parameters: Vec<ParameterMeta> = shared.to_vec();
        if let Some(params) = value.get("parameters") {
            for param in self.build_parameters(params, &format!("{pointer}/parameters"))? {
                // operation-level parameters override path-level ones
                parameters.retain(|p| !(p.name == param.name && p.location == param.location));
                parameters.push(param);
            }
        }

        let request_body = match value.get("requestBody") {
            Some(body) => Some(self.build_request_body(body, &format!("{pointer}/requestBody"))?),
            None => None,
        };

        let mut responses = HashMap::new();
        if let Some(resp_map) = value.get("responses").and_then(Value::as_object) {
            for (code, resp) in resp_map {
                let resp_pointer = format!("{pointer}/responses/{}", escape_token(code));
                let key = StatusKey::parse(code).ok_or_else(|| LoadError::InvalidStatusCode {
                    code: code.clone(),
                    pointer: resp_pointer.clone(),
                })?;
                let spec = self.build_response(resp, &resp_pointer)?;
                responses.insert(key, spec);
            }
        }

        Ok(Operation {
            method,
            path_template: template,
            operation_id,
            pointer,
            parameters,
            request_body,
            responses,
        })
    }

    fn build_parameters(
        &mut self,
        params: &Value,
        pointer: &str,
    ) -> Result<Vec<ParameterMeta>, LoadError> {
        let Some(list) = params.as_array() else {
            return Err(LoadError::InvalidSchema {
                pointer: pointer.to_string(),
                message: "parameters must be an array".to_string(),
            });
        };
        let mut out = Vec::with_capacity(list.len());
        for (i, entry) in list.iter().enumerate() {
            let entry_pointer = format!("{pointer}/{i}");
            let (param, param_pointer) =
                self.resolve_component(entry, &entry_pointer, "parameters")?;
            let name = param.get("name").and_then(Value::as_str);
            let location = param
                .get("in")
                .and_then(Value::as_str)
                .and_then(ParameterLocation::parse);
            let (Some(name), Some(location)) = (name, location) else {
                return Err(LoadError::InvalidSchema {
                    pointer: param_pointer,
                    message: "parameter needs a name and a valid `in`".to_string(),
                });
            };
            let required = location == ParameterLocation::Path
                || param.get("required").and_then(Value::as_bool).unwrap_or(false);
            let schema = match param.get("schema") {
                Some(s) => Some(self.build_schema(s, format!("{param_pointer}/schema"))?),
                None => None,
            };
            out.push(ParameterMeta {
                name: name.to_string(),
                location,
                required,
                schema,
                pointer: param_pointer,
            });
        }
        Ok(out)
    }

    fn build_request_body(&mut self, body: &Value, pointer: &str) -> Result<RequestBody, LoadError> {
        let (body, body_pointer) = self.resolve_component(body, pointer, "requestBodies")?;
        let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
        let content = body.get("content").and_then(Value::as_object);
        let content_types = content
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        let schema = match content.and_then(json_media) {
            Some((media_type, media)) => match media.get("schema") {
                Some(s) => Some(self.build_schema(
                    s,
                    format!("{body_pointer}/content/{}/schema", escape_token(media_type)),
                )?),
                None => None,
            },
            None => None,
        };
        Ok(RequestBody {
            required,
            content_types,
            schema,
            pointer: body_pointer,
        })
    }

    fn build_response(&mut self, resp: &Value, pointer: &str) -> Result<ResponseSpec, LoadError> {
        let (resp, resp_pointer) = self.resolve_component(resp, pointer, "responses")?;
        let Some(content) = resp.get("content").and_then(Value::as_object) else {
            return Ok(ResponseSpec {
                content_type: None,
                schema: None,
                pointer: resp_pointer,
            });
        };
        match json_media(content) {
            Some((media_type, media)) => {
                let schema = match media.get("schema") {
                    Some(s) => Some(self.build_schema(
                        s,
                        format!("{resp_pointer}/content/{}/schema", escape_token(media_type)),
                    )?),
                    None => None,
                };
                Ok(ResponseSpec {
                    content_type: Some(media_type.to_string()),
                    schema,
                    pointer: resp_pointer,
                })
            }
            None => Ok(ResponseSpec {
                content_type: content.keys().next().cloned(),
                schema: None,
                pointer: resp_pointer,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(root: Value) -> Result<SpecDocument, LoadError> {
        build_document(&root, "test".to_string())
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_token("/cities/{id}"), "~1cities~1{id}");
        assert_eq!(escape_token("a~b"), "a~0b");
        assert_eq!(unescape_token("~1cities~0x"), "/cities~x");
        assert_eq!(schema_ref_name("#/components/schemas/city"), Some("city".into()));
        assert_eq!(schema_ref_name("#/components/parameters/id"), None);
        assert_eq!(schema_ref_name("other.yaml#/City"), None);
    }

    #[test]
    fn test_json_media_selection() {
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
        let content = json!({"text/plain": {}, "application/vnd.api+json": {"schema": {}}});
        let (mt, _) = json_media(content.as_object().unwrap()).unwrap();
        assert_eq!(mt, "application/vnd.api+json");
    }

    #[test]
    fn test_version_check() {
        assert!(check_version(&json!({"openapi": "3.0.3"})).is_ok());
        assert!(check_version(&json!({"openapi": "3.1.0"})).is_ok());
        assert!(matches!(
            check_version(&json!({"swagger": "2.0"})),
            Err(LoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
        assert!(matches!(
            check_version(&json!({"openapi": "4.0.0"})),
            Err(LoadError::UnsupportedVersion(_))
        ));
        assert!(matches!(check_version(&json!({})), Err(LoadError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_nested_schema_pointers() {
        let doc = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "Cities", "version": "1"},
            "components": {"schemas": {
                "city": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}, "tags": {"type": "array", "items": {"type": "string"}}}
                }
            }},
            "paths": {}
        }))
        .unwrap();
        let id = doc.component("city").unwrap();
        let city = doc.schema(id).unwrap();
        assert_eq!(city.pointer, "#/components/schemas/city");
        let SchemaKind::Object { properties, required } = &city.kind else {
            panic!("expected object");
        };
        assert_eq!(required, &vec!["name".to_string()]);
        let tags = doc.schema(properties["tags"]).unwrap();
        let SchemaKind::Array { items: Some(items) } = &tags.kind else {
            panic!("expected array");
        };
        assert_eq!(
            doc.schema(*items).unwrap().pointer,
            "#/components/schemas/city/properties/tags/items"
        );
    }

    #[test]
    fn test_nullable_forms() {
        let doc = build(json!({
            "openapi": "3.1.0",
            "components": {"schemas": {
                "a": {"type": "string", "nullable": true},
                "b": {"type": ["integer", "null"]},
                "c": {"type": "string"}
            }}
        }))
        .unwrap();
        let get = |n| doc.schema(doc.component(n).unwrap()).unwrap().clone();
        assert!(get("a").nullable);
        assert!(get("b").nullable);
        assert_eq!(get("b").kind, SchemaKind::Integer);
        assert!(!get("c").nullable);
    }

    #[test]
    fn test_unresolved_ref_fails_fast() {
        let err = build(json!({
            "openapi": "3.0.0",
            "paths": {"/cities": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/missing"}}}
            }}}}}
        }))
        .unwrap_err();
        match err {
            LoadError::SchemaRef { reference, pointer } => {
                assert_eq!(reference, "#/components/schemas/missing");
                assert!(pointer.starts_with("#/paths/~1cities/get/responses/200"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_status_code() {
        let err = build(json!({
            "openapi": "3.0.0",
            "paths": {"/x": {"get": {"responses": {"OK": {"description": "ok"}}}}}
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidStatusCode { code, .. } if code == "OK"));
    }

    #[test]
    fn test_component_parameters_and_bodies_resolve() {
        let doc = build(json!({
            "openapi": "3.0.0",
            "components": {
                "parameters": {"Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}},
                "requestBodies": {"City": {"required": true, "content": {"application/json": {"schema": {"type": "object"}}}}},
                "responses": {"Ok": {"description": "ok", "content": {"application/json": {"schema": {"type": "array"}}}}}
            },
            "paths": {"/cities/{id}": {
                "parameters": [{"name": "id", "in": "path", "schema": {"type": "integer"}}],
                "post": {
                    "parameters": [{"$ref": "#/components/parameters/Limit"}],
                    "requestBody": {"$ref": "#/components/requestBodies/City"},
                    "responses": {"2XX": {"$ref": "#/components/responses/Ok"}}
                }
            }}
        }))
        .unwrap();
        let op = doc.path_item("/cities/{id}").unwrap().operation(&Method::POST).unwrap();
        assert_eq!(op.parameters.len(), 2);
        assert!(op.parameters.iter().any(|p| p.name == "id" && p.required));
        assert!(op.parameters.iter().any(|p| p.name == "limit" && !p.required));
        let body = op.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.schema.is_some());
        let resp = op.response_for(201).unwrap();
        assert_eq!(resp.content_type.as_deref(), Some("application/json"));
        assert!(resp.schema.is_some());
    }

    #[test]
    fn test_missing_component_parameter() {
        let err = build(json!({
            "openapi": "3.0.0",
            "paths": {"/x": {"get": {
                "parameters": [{"$ref": "#/components/parameters/Nope"}],
                "responses": {}
            }}}
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::SchemaRef { .. }));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let err = build(json!({
            "openapi": "3.0.0",
            "components": {"schemas": {"x": {"type": "date"}}}
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidSchema { .. }));
    }

    #[test]
    fn test_all_of_members_keep_refs() {
        let doc = build(json!({
            "openapi": "3.0.0",
            "components": {"schemas": {
                "base": {"type": "object", "required": ["a"], "properties": {"a": {"type": "string"}}},
                "x": {"allOf": [
                    {"$ref": "#/components/schemas/base"},
                    {"type": "object", "required": ["b"], "properties": {"b": {"type": "number"}}}
                ]}
            }}
        }))
        .unwrap();
        let schema = doc.schema(doc.component("x").unwrap()).unwrap();
        assert_eq!(schema.kind, SchemaKind::Any);
        assert_eq!(schema.all_of.len(), 2);
        assert_eq!(
            doc.schema(schema.all_of[0]).unwrap().kind,
            SchemaKind::Ref("base".to_string())
        );
        assert_eq!(
            doc.schema(schema.all_of[1]).unwrap().pointer,
            "#/components/schemas/x/allOf/1"
        );
    }

    #[test]
    fn test_all_of_kept_beside_type() {
        let doc = build(json!({
            "openapi": "3.0.0",
            "components": {"schemas": {
                "base": {"type": "object", "required": ["a"]},
                "x": {
                    "type": "object",
                    "required": ["b"],
                    "allOf": [{"$ref": "#/components/schemas/base"}]
                }
            }}
        }))
        .unwrap();
        let schema = doc.schema(doc.component("x").unwrap()).unwrap();
        assert!(matches!(&schema.kind, SchemaKind::Object { required, .. } if required == &["b"]));
        assert_eq!(schema.all_of.len(), 1);
        assert_eq!(
            doc.schema(schema.all_of[0]).unwrap().kind,
            SchemaKind::Ref("base".to_string())
        );
    }
}
