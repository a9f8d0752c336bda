use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::MiddlewareError;

/// Request with a buffered body, as seen by middleware.
pub type ApiRequest = http::Request<Vec<u8>>;
/// Response with a buffered body.
pub type ApiResponse = http::Response<Vec<u8>>;

/// Downstream application the pipeline forwards accepted requests to.
pub trait Handler: Send + Sync {
    fn call(&self, req: &ApiRequest) -> ApiResponse;
}

impl<F> Handler for F
where
    F: Fn(&ApiRequest) -> ApiResponse + Send + Sync,
{
    fn call(&self, req: &ApiRequest) -> ApiResponse {
        self(req)
    }
}

pub trait Middleware: Send + Sync {
    /// Inspect the request before it is forwarded. `Ok(Some(_))`
    /// short-circuits the handler with that response.
    fn before(&self, _req: &mut ApiRequest) -> Result<Option<ApiResponse>, MiddlewareError> {
        Ok(None)
    }

    fn after(
        &self,
        _req: &ApiRequest,
        _res: &mut ApiResponse,
        _latency: Duration,
    ) -> Result<(), MiddlewareError> {
        Ok(())
    }
}

/// Per-request lifecycle, logged at `debug` as the pipeline advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    RequestValidated,
    Forwarded,
    ResponseReceived,
    ResponseValidated,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Received => "received",
            Phase::RequestValidated => "request_validated",
            Phase::Forwarded => "forwarded",
            Phase::ResponseReceived => "response_received",
            Phase::ResponseValidated => "response_validated",
            Phase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// A handler wrapped in an ordered middleware list.
///
/// `before` hooks run in insertion order until one returns a response.
/// `after` hooks then run in insertion order on every middleware whose
/// `before` ran to completion, so a short-circuiting middleware and those
/// behind it never see the response.
#[derive(Clone)]
pub struct Pipeline {
    handler: Arc<dyn Handler>,
    /// Ordered list of middleware to apply to requests/responses
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("middleware_count", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            middlewares: Vec::new(),
        }
    }

    /// Add middleware to the processing pipeline
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn with_middleware(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.add_middleware(mw);
        self
    }

    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Run one exchange through the middleware and the handler.
    ///
    /// Returns `Err` only when a middleware's raise policy fires.
    pub fn dispatch(&self, mut req: ApiRequest) -> Result<ApiResponse, MiddlewareError> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let trace_phase = |phase: Phase| {
            debug!(method = %method, path = %path, phase = %phase, "Request phase");
        };

        trace_phase(Phase::Received);
        let mut early_resp = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            if let Some(resp) = mw.before(&mut req)? {
                debug!(
                    method = %method,
                    path = %path,
                    middleware_idx = idx,
                    status = resp.status().as_u16(),
                    "Middleware returned early response"
                );
                early_resp = Some((idx, resp));
                break;
            }
        }

        if let Some((idx, mut resp)) = early_resp {
            for mw in &self.middlewares[..idx] {
                mw.after(&req, &mut resp, Duration::ZERO)?;
            }
            trace_phase(Phase::Completed);
            return Ok(resp);
        }

        trace_phase(Phase::RequestValidated);
        trace_phase(Phase::Forwarded);
        let start = Instant::now();
        let mut resp = self.handler.call(&req);
        let latency = start.elapsed();
        info!(
            method = %method,
            path = %path,
            status = resp.status().as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Handler response received"
        );
        trace_phase(Phase::ResponseReceived);

        for mw in &self.middlewares {
            mw.after(&req, &mut resp, latency)?;
        }
        trace_phase(Phase::ResponseValidated);
        trace_phase(Phase::Completed);
        Ok(resp)
    }
}
