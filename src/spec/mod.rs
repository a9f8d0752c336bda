//! # Spec Module
//!
//! Loads an OpenAPI 3.x document (JSON or YAML) into an immutable
//! [`SpecDocument`].
//!
//! Schemas are stored in a flat arena addressed by [`SchemaId`]. A `$ref` is
//! kept as a [`SchemaKind::Ref`] node naming its component, which keeps
//! self-referential component graphs representable. All references, status
//! keys and path templates are validated while loading; a document that
//! loads successfully never produces a lookup error afterwards.
//!
//! ```rust,ignore
//! use oasguard::spec::load_spec;
//!
//! let doc = load_spec("openapi.yaml")?;
//! println!("{} operations", doc.operations().count());
//! ```

mod build;
mod load;
mod types;

pub use build::{escape_token, is_json_media_type, schema_ref_name, unescape_token};
pub use load::{load_spec, load_spec_from_str, SpecFormat};
pub use types::*;
