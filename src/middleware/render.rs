use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use super::core::ApiResponse;

/// Error response produced by an [`ErrorRenderer`].
#[derive(Debug, Clone)]
pub struct RenderedError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RenderedError {
    #[must_use]
    pub fn into_response(self) -> ApiResponse {
        let mut response = ApiResponse::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Turns a validation failure into an HTTP response.
///
/// `id` is a stable machine-readable code (`bad_request`,
/// `invalid_response`, `not_found`); `message` is the joined error list.
pub trait ErrorRenderer: Send + Sync {
    fn render(&self, status: StatusCode, id: &str, message: &str) -> RenderedError;
}

impl<F> ErrorRenderer for F
where
    F: Fn(StatusCode, &str, &str) -> RenderedError + Send + Sync,
{
    fn render(&self, status: StatusCode, id: &str, message: &str) -> RenderedError {
        self(status, id, message)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    id: &'a str,
    message: &'a str,
}

/// Default renderer: `{"id": ..., "message": ...}` as `application/json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorRenderer;

impl ErrorRenderer for JsonErrorRenderer {
    fn render(&self, status: StatusCode, id: &str, message: &str) -> RenderedError {
        let body = serde_json::to_vec(&ErrorBody { id, message }).unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RenderedError {
            status,
            headers,
            body,
        }
    }
}
