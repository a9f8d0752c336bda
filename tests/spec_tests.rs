#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::temp_files::{create_temp_json, create_temp_yaml};
use common::CITIES_SPEC;
use http::Method;
use oasguard::spec::{
    load_spec, load_spec_from_str, ParameterLocation, SchemaKind, SpecFormat, StatusKey,
};
use oasguard::LoadError;

#[test]
fn test_load_cities_from_yaml_file() {
    let file = create_temp_yaml(CITIES_SPEC);
    let doc = load_spec(file.path()).unwrap();
    assert_eq!(doc.title(), "Cities");
    assert_eq!(doc.api_version(), "1.0.0");
    assert_eq!(doc.openapi_version(), "3.0.3");
    assert_eq!(doc.paths().len(), 2);
    assert_eq!(doc.operations().count(), 4);
    assert_eq!(doc.component_names(), vec!["city", "error"]);
    assert_eq!(doc.fingerprint().len(), 16);
}

#[test]
fn test_load_json_file() {
    let json = r#"{
        "openapi": "3.1.0",
        "info": {"title": "t", "version": "2"},
        "paths": {"/ping": {"get": {"responses": {"200": {"description": "pong"}}}}}
    }"#;
    let file = create_temp_json(json);
    let doc = load_spec(file.path()).unwrap();
    assert_eq!(doc.openapi_version(), "3.1.0");
    assert!(doc.path_item("/ping").unwrap().operation(&Method::GET).is_some());
}

#[test]
fn test_same_source_same_fingerprint() {
    let a = load_spec_from_str(CITIES_SPEC, SpecFormat::Yaml).unwrap();
    let b = load_spec_from_str(CITIES_SPEC, SpecFormat::Auto).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_operation_metadata_resolved() {
    let doc = load_spec_from_str(CITIES_SPEC, SpecFormat::Yaml).unwrap();
    let get_city = doc
        .path_item("/cities/{id}")
        .and_then(|item| item.operation(&Method::GET))
        .unwrap();
    assert_eq!(get_city.operation_id.as_deref(), Some("getCity"));
    assert_eq!(get_city.pointer, "#/paths/~1cities~1{id}/get");

    // path-level parameter from components, plus the operation's header
    let names: Vec<(&str, ParameterLocation)> = get_city
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    assert!(names.contains(&("id", ParameterLocation::Path)));
    assert!(names.contains(&("X-Request-Id", ParameterLocation::Header)));

    assert!(get_city.responses.contains_key(&StatusKey::Code(404)));
    let not_found = get_city.response_for(404).unwrap();
    assert_eq!(not_found.content_type.as_deref(), Some("application/json"));

    let create = doc
        .path_item("/cities")
        .and_then(|item| item.operation(&Method::POST))
        .unwrap();
    let body = create.request_body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(body.content_types, vec!["application/json".to_string()]);
    let schema = doc.schema(body.schema.unwrap()).unwrap();
    assert!(matches!(schema.kind, SchemaKind::Object { .. }));
    assert_eq!(
        schema.pointer,
        "#/components/requestBodies/CityBody/content/application~1json/schema"
    );

    // the default response comes from #/components/responses
    let list = doc
        .path_item("/cities")
        .and_then(|item| item.operation(&Method::GET))
        .unwrap();
    let fallback = list.response_for(503).unwrap();
    assert_eq!(fallback.pointer, "#/components/responses/Error");
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_spec("/nonexistent/oasguard/openapi.yaml").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/oasguard/openapi.yaml"));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let file = create_temp_yaml("openapi: 3.0.0\npaths: [unclosed\n");
    assert!(matches!(load_spec(file.path()), Err(LoadError::Parse(_))));
}

#[test]
fn test_swagger_2_rejected() {
    let err = load_spec_from_str(
        "swagger: \"2.0\"\ninfo: {title: t, version: \"1\"}\npaths: {}\n",
        SpecFormat::Yaml,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedVersion(v) if v == "2.0"));
}

#[test]
fn test_dangling_ref_fails_at_load() {
    let spec = r##"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /a:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/missing"
"##;
    match load_spec_from_str(spec, SpecFormat::Yaml).unwrap_err() {
        LoadError::SchemaRef { reference, .. } => {
            assert_eq!(reference, "#/components/schemas/missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bad_status_key_fails_at_load() {
    let spec = r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /a:
    get:
      responses:
        "20x":
          description: nope
"#;
    assert!(matches!(
        load_spec_from_str(spec, SpecFormat::Yaml),
        Err(LoadError::InvalidStatusCode { code, .. }) if code == "20x"
    ));
}

#[test]
fn test_equally_specific_templates_rejected() {
    let spec = r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /cities/{id}:
    get:
      responses:
        "200": {description: ok}
  /cities/{name}:
    get:
      responses:
        "200": {description: ok}
"#;
    assert!(matches!(
        load_spec_from_str(spec, SpecFormat::Yaml),
        Err(LoadError::AmbiguousPaths { .. })
    ));
}

#[test]
fn test_broken_template_rejected() {
    let spec = r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /cities/{id:
    get:
      responses:
        "200": {description: ok}
"#;
    assert!(matches!(
        load_spec_from_str(spec, SpecFormat::Yaml),
        Err(LoadError::InvalidPathTemplate { .. })
    ));
}

#[test]
fn test_self_referential_component_loads() {
    let spec = r##"
openapi: 3.0.0
info: {title: t, version: "1"}
paths: {}
components:
  schemas:
    tree:
      type: object
      properties:
        children:
          type: array
          items:
            $ref: "#/components/schemas/tree"
"##;
    let doc = load_spec_from_str(spec, SpecFormat::Yaml).unwrap();
    let tree = doc.component("tree").unwrap();
    assert!(doc.resolve(tree).is_some());
}
