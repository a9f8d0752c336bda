//! # Router Module
//!
//! Maps an incoming `(method, path)` pair to the documented [`Operation`]
//! of a loaded [`SpecDocument`].
//!
//! ## Architecture
//!
//! 1. **Compilation**: at construction every path template (e.g.
//!    `/cities/{id}`) is split into segments and inserted into a segment
//!    radix tree. Template syntax and ambiguity were already checked by the
//!    loader.
//!
//! 2. **Matching**: the request path is stripped of its query string,
//!    fragment and configured prefix, then walked through the tree. When
//!    several templates fit, the one with the fewest `{param}` segments wins.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oasguard::router::{RouteLookup, Router};
//! use oasguard::spec::load_spec;
//!
//! let doc = load_spec("openapi.yaml")?;
//! let router = Router::new(&doc).with_prefix("/api");
//!
//! match router.lookup(&http::Method::GET, "/api/cities/42?units=metric") {
//!     RouteLookup::Matched(m) => println!("{} id={:?}", m.template, m.get_path_param("id")),
//!     RouteLookup::MethodNotDocumented { template } => println!("{template}: method not documented"),
//!     RouteLookup::PathNotDocumented => println!("not documented"),
//! }
//! ```
//!
//! [`Operation`]: crate::spec::Operation
//! [`SpecDocument`]: crate::spec::SpecDocument

mod core;
mod radix;

pub use self::core::{ParamVec, RouteLookup, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use radix::{check_ambiguity, parse_template, RadixRouter, Segment};
