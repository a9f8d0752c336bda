//! # oasguard
//!
//! **oasguard** validates HTTP requests and responses against an
//! [OpenAPI 3.x](https://spec.openapis.org/oas/v3.0.3) document. Load the
//! document once at startup, wrap your handler in a [`middleware::Pipeline`]
//! and every exchange on a documented route is checked against its schemas.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Loads JSON/YAML documents into an immutable, fully
//!   resolved [`SpecDocument`] with a schema arena
//! - **[`router`]** - Segment radix tree mapping `(method, path)` to a
//!   documented operation and its path parameters
//! - **[`validator`]** - Validates `serde_json::Value` instances against
//!   schema ids; collects every error
//! - **[`middleware`]** - Request/response validation middleware, policies
//!   (block, raise, ignore) and error rendering
//! - **[`config`]** - YAML and `OASGUARD_*` environment configuration
//! - **[`logging`]** - `tracing` subscriber initialization
//! - **[`cli`]** - The `oasguard` command line
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Pipeline
//!     participant MW as ValidationMiddleware
//!     participant Router
//!     participant Validator
//!     participant Handler
//!
//!     Client->>Pipeline: dispatch(request)
//!     Pipeline->>MW: before(&mut request)
//!     MW->>Router: lookup(method, path)
//!     Router-->>MW: Matched / MethodNotDocumented / PathNotDocumented
//!     MW->>Validator: validate(params, body)
//!     alt invalid
//!         MW-->>Pipeline: 400 bad_request (or Err when raising)
//!     else valid or undocumented
//!         Pipeline->>Handler: call(&request)
//!         Handler-->>Pipeline: response
//!         Pipeline->>MW: after(&request, &mut response)
//!         MW->>Validator: validate(response body)
//!         Note over MW: invalid → 500 invalid_response
//!     end
//!     Pipeline-->>Client: response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oasguard::config::ValidationConfig;
//! use oasguard::middleware::{ApiRequest, ApiResponse, Pipeline, ValidationMiddleware};
//!
//! let doc = Arc::new(oasguard::load_spec("openapi.yaml")?);
//! let validation = ValidationMiddleware::builder(doc)
//!     .config(ValidationConfig::from_env()?)
//!     .error_handler(|e| eprintln!("{e}"))
//!     .build();
//! let pipeline = Pipeline::new(|_req: &ApiRequest| ApiResponse::new(b"[]".to_vec()))
//!     .with_middleware(Arc::new(validation));
//!
//! let response = pipeline.dispatch(request)?;
//! ```
//!
//! ## Error Responses
//!
//! | Failure | Status | Body |
//! |---|---|---|
//! | Request invalid | 400 | `{"id": "bad_request", "message": "..."}` |
//! | Response invalid | 500 | `{"id": "invalid_response", "message": "..."}` |
//! | Undocumented route (strict) | 404 | `{"id": "not_found", "message": "..."}` |
//!
//! Messages join every error as `"<schema pointer> <message>"` with `"; "`,
//! e.g. `#/components/schemas/city missing required parameters: name`.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod spec;
pub mod validator;

pub use config::ValidationConfig;
pub use error::{ConfigError, LoadError, MiddlewareError};
pub use middleware::{Pipeline, ValidationMiddleware};
pub use router::{RouteLookup, RouteMatch, Router};
pub use spec::{load_spec, load_spec_from_str, SpecDocument, SpecFormat};
pub use validator::{SchemaValidator, ValidationError, ValidationErrorKind};
