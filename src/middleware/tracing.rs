use std::time::Duration;

use tracing::{debug, info};

use super::core::{ApiRequest, ApiResponse, Middleware};
use crate::error::MiddlewareError;
use crate::router::RouteMatch;

/// Logs every exchange at `info`: method, path, status and latency.
///
/// Add it before the validation middleware to log requests rejected there
/// too; the documented template is included when the request was matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &mut ApiRequest) -> Result<Option<ApiResponse>, MiddlewareError> {
        debug!(
            method = %req.method(),
            path = %req.uri().path(),
            body_bytes = req.body().len(),
            "Request received"
        );
        Ok(None)
    }

    fn after(
        &self,
        req: &ApiRequest,
        res: &mut ApiResponse,
        latency: Duration,
    ) -> Result<(), MiddlewareError> {
        let template = req
            .extensions()
            .get::<RouteMatch>()
            .map(|m| m.template.to_string());
        info!(
            method = %req.method(),
            path = %req.uri().path(),
            template = ?template,
            status = res.status().as_u16(),
            latency_ms = latency.as_millis() as u64,
            response_bytes = res.body().len(),
            "Request completed"
        );
        Ok(())
    }
}
