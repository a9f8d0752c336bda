//! # Middleware Module
//!
//! A [`Pipeline`] wraps a downstream [`Handler`] in an ordered list of
//! [`Middleware`]. Each exchange moves through the [`Phase`]s
//! `Received → RequestValidated → Forwarded → ResponseReceived →
//! ResponseValidated → Completed`.
//!
//! - [`ValidationMiddleware`] validates requests and responses against an
//!   OpenAPI document
//! - [`TracingMiddleware`] logs each exchange
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oasguard::middleware::{Pipeline, TracingMiddleware, ValidationMiddleware};
//!
//! let doc = Arc::new(oasguard::spec::load_spec("openapi.yaml")?);
//! let pipeline = Pipeline::new(|req: &ApiRequest| app(req))
//!     .with_middleware(Arc::new(TracingMiddleware))
//!     .with_middleware(Arc::new(ValidationMiddleware::new(doc, config)));
//! let response = pipeline.dispatch(request)?;
//! ```

mod core;
mod render;
mod tracing;
mod validation;

pub use self::core::{ApiRequest, ApiResponse, Handler, Middleware, Phase, Pipeline};
pub use render::{ErrorRenderer, JsonErrorRenderer, RenderedError};
pub use self::tracing::TracingMiddleware;
pub use validation::{
    ErrorHandler, RaisePolicy, RaisePredicate, RequestVerdict, ValidationMiddleware,
    ValidationMiddlewareBuilder,
};
