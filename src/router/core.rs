//! Router core module - request path to documented operation.

use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::radix::RadixRouter;
use crate::spec::{Operation, SpecDocument};

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the lookup hot path.
///
/// Names are `Arc<str>` shared with the route tree; values are the
/// percent-decoded request segments.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A request matched to a documented operation.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub operation: Arc<Operation>,
    /// Template that matched, e.g. `/cities/{id}`
    pub template: Arc<str>,
    /// Path parameters extracted from the URL (`{id}` → `("id", "123")`)
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics if a template repeats a name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap. Allocates.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Outcome of a route lookup.
///
/// Neither "not documented" outcome is an error: the middleware skips
/// validation for them unless strict mode is on.
#[derive(Debug, Clone)]
pub enum RouteLookup {
    Matched(RouteMatch),
    /// The path matched a template that does not document this method
    MethodNotDocumented { template: Arc<str> },
    PathNotDocumented,
}

impl RouteLookup {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteLookup::Matched(_))
    }

    #[must_use]
    pub fn into_match(self) -> Option<RouteMatch> {
        match self {
            RouteLookup::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Router that maps requests to documented operations using a radix tree.
#[derive(Debug, Clone)]
pub struct Router {
    radix_router: RadixRouter,
    /// Mount prefix stripped before matching (e.g., `/api/v1`)
    prefix: Option<String>,
}

impl Router {
    /// Build a router over every path template of `doc`.
    #[must_use]
    pub fn new(doc: &SpecDocument) -> Self {
        let radix_router = RadixRouter::new(doc);
        debug!(
            templates = radix_router.template_count(),
            routing_algorithm = "radix_tree",
            "Routing table built"
        );
        Self {
            radix_router,
            prefix: None,
        }
    }

    /// Only paths under `prefix` are considered documented; the prefix is
    /// stripped before matching. An empty or `/` prefix is ignored.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        self.prefix = if trimmed.is_empty() {
            None
        } else if trimmed.starts_with('/') {
            Some(trimmed.to_string())
        } else {
            Some(format!("/{trimmed}"))
        };
        self
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Match a request.
    ///
    /// `raw_path` may carry a query string or fragment; both are ignored.
    #[must_use]
    pub fn lookup(&self, method: &Method, raw_path: &str) -> RouteLookup {
        let match_start = Instant::now();
        let path = raw_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        let Some(path) = self.strip_prefix(path) else {
            debug!(method = %method, path = %raw_path, "Path outside configured prefix");
            return RouteLookup::PathNotDocumented;
        };

        let Some((terminal, raw_params)) = self.radix_router.find(path) else {
            debug!(method = %method, path = %path, "Path not documented");
            return RouteLookup::PathNotDocumented;
        };

        let Some(operation) = terminal.operations.get(method) else {
            debug!(
                method = %method,
                path = %path,
                template = %terminal.template,
                "Method not documented for path"
            );
            return RouteLookup::MethodNotDocumented {
                template: Arc::clone(&terminal.template),
            };
        };

        let path_params: ParamVec = raw_params
            .into_iter()
            .map(|(name, value)| {
                // invalid UTF-8 escapes keep the raw segment
                let decoded = urlencoding::decode(&value).map(Cow::into_owned).ok();
                (name, decoded.unwrap_or(value))
            })
            .collect();

        let match_duration = match_start.elapsed();
        if match_duration > Duration::from_millis(1) {
            warn!(
                method = %method,
                path = %path,
                template = %terminal.template,
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            );
        } else {
            debug!(
                method = %method,
                path = %path,
                template = %terminal.template,
                operation = %operation.label(),
                path_params = ?path_params,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }

        RouteLookup::Matched(RouteMatch {
            operation: Arc::clone(operation),
            template: Arc::clone(&terminal.template),
            path_params,
        })
    }

    /// Convenience form of [`Router::lookup`]: `Some` only for a full match.
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        self.lookup(&method, path).into_match()
    }

    fn strip_prefix<'p>(&self, path: &'p str) -> Option<&'p str> {
        match &self.prefix {
            None => Some(path),
            Some(prefix) => {
                let rest = path.strip_prefix(prefix.as_str())?;
                // `/api` must not match `/apiary`
                if rest.is_empty() || rest.starts_with('/') {
                    Some(rest)
                } else {
                    None
                }
            }
        }
    }
}
