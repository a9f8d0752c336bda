use super::{SchemaValidator, ValidationErrorKind};
use crate::spec::{load_spec_from_str, SpecDocument, SpecFormat};
use serde_json::json;

const SPEC: &str = r##"
openapi: 3.0.3
info:
  title: validator
  version: "1"
paths: {}
components:
  schemas:
    city:
      type: object
      required: [name, country]
      properties:
        name: { type: string }
        country: { type: string }
        population: { type: integer }
        area: { type: number }
        capital: { type: boolean }
        mayor:
          type: string
          nullable: true
        tags:
          type: array
          items: { type: string }
        climate:
          type: string
          enum: [arid, temperate, tropical]
        twin:
          $ref: "#/components/schemas/city"
    node:
      type: object
      properties:
        next:
          $ref: "#/components/schemas/node"
    loop_a:
      $ref: "#/components/schemas/loop_b"
    loop_b:
      $ref: "#/components/schemas/loop_a"
    named:
      type: object
      required: [name]
      properties:
        name: { type: string }
    capital:
      allOf:
        - $ref: "#/components/schemas/named"
        - type: object
          required: [country]
    branching:
      allOf:
        - $ref: "#/components/schemas/branching"
        - $ref: "#/components/schemas/branching"
    capital_city:
      type: object
      required: [capital]
      properties:
        capital: { type: boolean }
      allOf:
        - $ref: "#/components/schemas/named"
    anything: {}
"##;

fn doc() -> SpecDocument {
    load_spec_from_str(SPEC, SpecFormat::Yaml).unwrap()
}

#[test]
fn test_valid_instance_has_no_errors() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let instance = json!({
        "name": "Berlin",
        "country": "DE",
        "population": 3_700_000,
        "area": 891.8,
        "capital": true,
        "mayor": null,
        "tags": ["spree"],
        "climate": "temperate",
        "unknown": {"anything": "goes"}
    });
    assert!(SchemaValidator::new(&doc).validate(city, &instance).is_empty());
}

#[test]
fn test_missing_required_lists_all_names() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let errors = SchemaValidator::new(&doc).validate(city, &json!({}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::MissingRequired);
    assert_eq!(errors[0].instance_path, "");
    assert_eq!(
        errors[0].to_string(),
        "#/components/schemas/city missing required parameters: name, country"
    );
}

#[test]
fn test_root_type_mismatch_is_single_error() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let errors = SchemaValidator::new(&doc).validate(city, &json!([{"name": "x"}]));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::TypeMismatch);
    assert_eq!(errors[0].instance_path, "");
    assert_eq!(errors[0].message, "expected object, but received array");
}

#[test]
fn test_nested_errors_carry_paths() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let instance = json!({
        "name": "Berlin",
        "country": "DE",
        "population": 3.5,
        "tags": ["ok", 7],
        "climate": "polar",
        "mayor": 1
    });
    let errors = SchemaValidator::new(&doc).validate(city, &instance);
    let mut paths: Vec<(&str, ValidationErrorKind)> = errors
        .iter()
        .map(|e| (e.instance_path.as_str(), e.kind))
        .collect();
    paths.sort_by_key(|(p, _)| *p);
    assert_eq!(
        paths,
        vec![
            ("/climate", ValidationErrorKind::EnumMismatch),
            ("/mayor", ValidationErrorKind::TypeMismatch),
            ("/population", ValidationErrorKind::TypeMismatch),
            ("/tags/1", ValidationErrorKind::TypeMismatch),
        ]
    );
    let population = errors
        .iter()
        .find(|e| e.instance_path == "/population")
        .unwrap();
    assert_eq!(
        population.location,
        "#/components/schemas/city/properties/population"
    );
    assert_eq!(population.message, "expected integer, but received number");
}

#[test]
fn test_null_requires_nullable() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let errors = SchemaValidator::new(&doc).validate(city, &json!(null));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected object, but received null");

    let anything = doc.component("anything").unwrap();
    assert!(SchemaValidator::new(&doc).validate(anything, &json!(null)).is_empty());
    assert!(SchemaValidator::new(&doc).validate(anything, &json!([1, "a"])).is_empty());
}

#[test]
fn test_self_reference_validates_nested_instances() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let instance = json!({
        "name": "Berlin",
        "country": "DE",
        "twin": {"name": "Los Angeles"}
    });
    let errors = SchemaValidator::new(&doc).validate(city, &instance);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].instance_path, "/twin");
    assert_eq!(errors[0].kind, ValidationErrorKind::MissingRequired);
    assert_eq!(errors[0].location, "#/components/schemas/city");
}

#[test]
fn test_deep_instance_hits_depth_bound() {
    let doc = doc();
    let node = doc.component("node").unwrap();
    let mut instance = json!({});
    for _ in 0..10 {
        instance = json!({ "next": instance });
    }
    let validator = SchemaValidator::new(&doc);
    assert!(validator.validate(node, &instance).is_empty());

    let shallow = validator.with_max_depth(6);
    let errors = shallow.validate(node, &instance);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::SchemaTooDeep);
}

#[test]
fn test_ref_cycle_is_bounded() {
    let doc = doc();
    let loop_a = doc.component("loop_a").unwrap();
    let errors = SchemaValidator::new(&doc).validate(loop_a, &json!({"x": 1}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::SchemaTooDeep);
    assert_eq!(errors[0].instance_path, "");
}

#[test]
fn test_all_of_checks_every_member() {
    let doc = doc();
    let capital = doc.component("capital").unwrap();
    let validator = SchemaValidator::new(&doc);
    assert!(validator
        .validate(capital, &json!({"name": "Paris", "country": "FR"}))
        .is_empty());

    let errors = validator.validate(capital, &json!({}));
    let mut messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "#/components/schemas/capital/allOf/1 missing required parameters: country",
            "#/components/schemas/named missing required parameters: name",
        ]
    );
}

#[test]
fn test_branching_all_of_cycle_reports_once() {
    let doc = doc();
    let branching = doc.component("branching").unwrap();
    for depth in [8, 20, super::DEFAULT_MAX_DEPTH, super::MAX_DEPTH_LIMIT] {
        let errors = SchemaValidator::new(&doc)
            .with_max_depth(depth)
            .validate(branching, &json!({}));
        assert_eq!(errors.len(), 1, "max_depth {depth}");
        assert_eq!(errors[0].kind, ValidationErrorKind::SchemaTooDeep);
        assert_eq!(errors[0].location, "#/components/schemas/branching");
    }
}

#[test]
fn test_all_of_beside_type_is_enforced() {
    let doc = doc();
    let capital_city = doc.component("capital_city").unwrap();
    let validator = SchemaValidator::new(&doc);
    assert!(validator
        .validate(capital_city, &json!({"name": "Paris", "capital": true}))
        .is_empty());

    let errors = validator.validate(capital_city, &json!({"capital": "yes"}));
    let mut messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "#/components/schemas/capital_city/properties/capital expected boolean, but received string",
            "#/components/schemas/named missing required parameters: name",
        ]
    );

    let errors = validator.validate(capital_city, &json!("Paris"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::TypeMismatch);
}

#[test]
fn test_validation_is_idempotent() {
    let doc = doc();
    let city = doc.component("city").unwrap();
    let instance = json!({"name": 1, "tags": "x"});
    let validator = SchemaValidator::new(&doc);
    assert_eq!(validator.validate(city, &instance), validator.validate(city, &instance));
}
