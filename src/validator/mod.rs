//! # Validator Module
//!
//! Validates JSON instances against the schema arena of a loaded
//! [`SpecDocument`](crate::spec::SpecDocument).
//!
//! Supported keywords: `type` (object, array, string, number, integer,
//! boolean), `properties`, `required`, `items`, `enum`, `nullable`, `allOf`
//! and `$ref` to component schemas. Undeclared properties are never errors.
//!
//! Validation is a pure function of `(document, schema, instance)`: it
//! collects every error instead of stopping at the first one, and running it
//! twice yields the same list. `$ref` lookups are cached per call and the
//! combined property/item/ref depth is bounded, so self-referential
//! components cannot overflow the stack.
//!
//! ```rust,ignore
//! use oasguard::validator::SchemaValidator;
//!
//! let city = doc.component("city").unwrap();
//! let errors = SchemaValidator::new(&doc).validate(city, &serde_json::json!({}));
//! assert_eq!(errors[0].to_string(), "#/components/schemas/city missing required parameters: name");
//! ```

mod core;
mod error;
#[cfg(test)]
mod tests;

pub use self::core::{
    json_type_name, validate, SchemaValidator, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT,
};
pub use error::{join_messages, print_errors, ValidationError, ValidationErrorKind};
