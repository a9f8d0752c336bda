//! # CLI Module
//!
//! Command-line access to the loader, router and validator, for checking a
//! specification or reproducing a validation failure outside a service.
//!
//! ## Commands
//!
//! ```bash
//! # Load, resolve and summarise a specification (exit 1 on load errors)
//! oasguard check --spec openapi.yaml
//!
//! # List documented operations
//! oasguard routes --spec openapi.yaml
//!
//! # Show which operation a request path resolves to
//! oasguard match --spec openapi.yaml --method GET --path /cities/42
//!
//! # Validate a request body, or a response body when --status is given
//! oasguard validate --spec openapi.yaml --method POST --path /cities --body city.json
//! oasguard validate --spec openapi.yaml --method GET --path /cities --status 200 --body list.json
//! ```
//!
//! `validate` and `match` exit with status 1 when the payload is invalid or
//! the path is not documented.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
