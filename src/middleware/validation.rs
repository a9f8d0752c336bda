//! OpenAPI request/response validation middleware.
//!
//! Requests are matched against the document, their parameters and JSON body
//! validated, and rejected with `400 bad_request` on failure. Responses of
//! matched requests are validated on the way out and replaced with
//! `500 invalid_response` on failure. Both directions can instead raise
//! ([`MiddlewareError`]) or merely report (`ignore_error`).
//!
//! The route match found in `before` is stored in the request extensions,
//! where downstream handlers can read it as [`RouteMatch`].

use http::header::{CONTENT_TYPE, COOKIE};
use http::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::core::{ApiRequest, ApiResponse, Middleware};
use super::render::{ErrorRenderer, JsonErrorRenderer};
use crate::config::ValidationConfig;
use crate::error::MiddlewareError;
use crate::router::{RouteLookup, RouteMatch, Router};
use crate::spec::{
    escape_token, is_json_media_type, Operation, ParameterLocation, ParameterMeta, SchemaId,
    SchemaKind, SpecDocument,
};
use crate::validator::{join_messages, SchemaValidator, ValidationError, ValidationErrorKind};

/// Callback invoked once per validation error, before the policy applies.
pub type ErrorHandler = Arc<dyn Fn(&ValidationError) + Send + Sync>;
/// Decides from the error list whether a failure is raised.
pub type RaisePredicate = Arc<dyn Fn(&[ValidationError]) -> bool + Send + Sync>;

/// When a validation failure is surfaced as `Err` instead of a response.
#[derive(Clone)]
pub enum RaisePolicy {
    Never,
    Always,
    When(RaisePredicate),
}

impl RaisePolicy {
    #[must_use]
    pub fn from_flag(raise: bool) -> Self {
        if raise {
            RaisePolicy::Always
        } else {
            RaisePolicy::Never
        }
    }

    #[must_use]
    pub fn fires(&self, errors: &[ValidationError]) -> bool {
        match self {
            RaisePolicy::Never => false,
            RaisePolicy::Always => true,
            RaisePolicy::When(predicate) => predicate(errors),
        }
    }
}

impl fmt::Debug for RaisePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaisePolicy::Never => f.write_str("Never"),
            RaisePolicy::Always => f.write_str("Always"),
            RaisePolicy::When(_) => f.write_str("When(<predicate>)"),
        }
    }
}

/// Outcome of request validation.
#[derive(Debug, Clone)]
pub enum RequestVerdict {
    /// The route is not documented and strict mode is off
    Undocumented,
    Valid(RouteMatch),
    /// Strict mode: the route is not documented
    NotFound(Vec<ValidationError>),
    Invalid(RouteMatch, Vec<ValidationError>),
}

pub struct ValidationMiddlewareBuilder {
    doc: Arc<SpecDocument>,
    config: ValidationConfig,
    error_handler: Option<ErrorHandler>,
    renderer: Arc<dyn ErrorRenderer>,
    request_raise: Option<RaisePolicy>,
    response_raise: Option<RaisePolicy>,
}

impl ValidationMiddlewareBuilder {
    #[must_use]
    pub fn config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn error_handler(mut self, handler: impl Fn(&ValidationError) + Send + Sync + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: impl ErrorRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Raise request failures when `predicate` holds, overriding `request.raise`.
    #[must_use]
    pub fn raise_request_when(
        mut self,
        predicate: impl Fn(&[ValidationError]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.request_raise = Some(RaisePolicy::When(Arc::new(predicate)));
        self
    }

    /// Raise response failures when `predicate` holds, overriding `response.raise`.
    #[must_use]
    pub fn raise_response_when(
        mut self,
        predicate: impl Fn(&[ValidationError]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.response_raise = Some(RaisePolicy::When(Arc::new(predicate)));
        self
    }

    #[must_use]
    pub fn build(self) -> ValidationMiddleware {
        let mut router = Router::new(&self.doc);
        if let Some(prefix) = &self.config.prefix {
            router = router.with_prefix(prefix.as_str());
        }
        let request_raise = self
            .request_raise
            .unwrap_or_else(|| RaisePolicy::from_flag(self.config.request.raise));
        let response_raise = self
            .response_raise
            .unwrap_or_else(|| RaisePolicy::from_flag(self.config.response.raise));
        debug!(
            fingerprint = %self.doc.fingerprint(),
            prefix = ?router.prefix(),
            strict = self.config.strict,
            request_raise = ?request_raise,
            response_raise = ?response_raise,
            "Validation middleware built"
        );
        ValidationMiddleware {
            doc: self.doc,
            router,
            config: self.config,
            request_raise,
            response_raise,
            error_handler: self.error_handler,
            renderer: self.renderer,
        }
    }
}

pub struct ValidationMiddleware {
    doc: Arc<SpecDocument>,
    router: Router,
    config: ValidationConfig,
    request_raise: RaisePolicy,
    response_raise: RaisePolicy,
    error_handler: Option<ErrorHandler>,
    renderer: Arc<dyn ErrorRenderer>,
}

impl fmt::Debug for ValidationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationMiddleware")
            .field("fingerprint", &self.doc.fingerprint())
            .field("config", &self.config)
            .field("request_raise", &self.request_raise)
            .field("response_raise", &self.response_raise)
            .finish_non_exhaustive()
    }
}

impl ValidationMiddleware {
    #[must_use]
    pub fn builder(doc: Arc<SpecDocument>) -> ValidationMiddlewareBuilder {
        ValidationMiddlewareBuilder {
            doc,
            config: ValidationConfig::default(),
            error_handler: None,
            renderer: Arc::new(JsonErrorRenderer),
            request_raise: None,
            response_raise: None,
        }
    }

    #[must_use]
    pub fn new(doc: Arc<SpecDocument>, config: ValidationConfig) -> Self {
        Self::builder(doc).config(config).build()
    }

    #[must_use]
    pub fn document(&self) -> &SpecDocument {
        &self.doc
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn schema_validator(&self) -> SchemaValidator<'_> {
        SchemaValidator::new(&self.doc).with_max_depth(self.config.max_depth)
    }

    /// Match and validate a request without applying any policy.
    #[must_use]
    pub fn validate_request(&self, req: &ApiRequest) -> RequestVerdict {
        let path = req.uri().path();
        match self.router.lookup(req.method(), path) {
            RouteLookup::Matched(route) => {
                if !self.config.request.enabled {
                    return RequestVerdict::Valid(route);
                }
                let errors = self.check_request(&route, req);
                if errors.is_empty() {
                    RequestVerdict::Valid(route)
                } else {
                    RequestVerdict::Invalid(route, errors)
                }
            }
            lookup if !self.config.strict => {
                debug!(method = %req.method(), path = %path, lookup = ?lookup, "Skipping undocumented route");
                RequestVerdict::Undocumented
            }
            RouteLookup::MethodNotDocumented { template } => {
                RequestVerdict::NotFound(vec![ValidationError::new(
                    ValidationErrorKind::UnknownMethod,
                    format!("#/paths/{}", escape_token(&template)),
                    "",
                    format!("method {} is not documented", req.method()),
                )])
            }
            RouteLookup::PathNotDocumented => RequestVerdict::NotFound(vec![ValidationError::new(
                ValidationErrorKind::UnknownPath,
                "#/paths",
                "",
                format!("path {path} is not documented"),
            )]),
        }
    }

    /// Validate a response to a matched request. Empty when valid or skipped.
    #[must_use]
    pub fn validate_response(&self, route: &RouteMatch, res: &ApiResponse) -> Vec<ValidationError> {
        let status = res.status();
        if self.config.response.validate_success_only && !status.is_success() {
            return Vec::new();
        }
        let op = &route.operation;
        let Some(spec) = op.response_for(status.as_u16()) else {
            debug!(operation = %op.label(), status = status.as_u16(), "Response status not documented");
            return Vec::new();
        };
        let Some(schema) = spec.schema else {
            return Vec::new();
        };

        if let Some(content_type) = media_type(res.headers()) {
            if !is_json_media_type(&content_type) {
                if !self.config.check_content_type {
                    return Vec::new();
                }
                return vec![ValidationError::new(
                    ValidationErrorKind::InvalidContentType,
                    spec.pointer.as_str(),
                    "",
                    format!(
                        "content type {content_type:?} does not match documented {:?}",
                        spec.content_type.as_deref().unwrap_or_default()
                    ),
                )];
            }
        }

        if res.body().is_empty() {
            return vec![ValidationError::new(
                ValidationErrorKind::InvalidBody,
                spec.pointer.as_str(),
                "",
                "response body is empty",
            )];
        }
        match serde_json::from_slice::<Value>(res.body()) {
            Ok(body) => self.schema_validator().validate(schema, &body),
            Err(e) => vec![ValidationError::new(
                ValidationErrorKind::InvalidBody,
                spec.pointer.as_str(),
                "",
                format!("response body is not valid JSON: {e}"),
            )],
        }
    }

    fn check_request(&self, route: &RouteMatch, req: &ApiRequest) -> Vec<ValidationError> {
        let op = &route.operation;
        let mut errors = self.check_parameters(route, req);
        let Some(body) = &op.request_body else {
            return errors;
        };

        if req.body().is_empty() {
            if body.required {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingBody,
                    body.pointer.as_str(),
                    "",
                    "request body is required",
                ));
            }
            return errors;
        }

        let content_type = media_type(req.headers());
        if self.config.check_content_type && !body.content_types.is_empty() {
            let accepted = content_type
                .as_deref()
                .is_some_and(|ct| media_matches(ct, &body.content_types));
            if !accepted {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidContentType,
                    body.pointer.as_str(),
                    "",
                    format!(
                        "content type {:?} is not one of [{}]",
                        content_type.as_deref().unwrap_or_default(),
                        body.content_types.join(", ")
                    ),
                ));
            }
        }

        let is_json = content_type.as_deref().map_or(true, is_json_media_type);
        if let Some(schema) = body.schema.filter(|_| is_json) {
            match serde_json::from_slice::<Value>(req.body()) {
                Ok(instance) => errors.extend(self.schema_validator().validate(schema, &instance)),
                Err(e) => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidBody,
                    body.pointer.as_str(),
                    "",
                    format!("request body is not valid JSON: {e}"),
                )),
            }
        }
        errors
    }

    fn check_parameters(&self, route: &RouteMatch, req: &ApiRequest) -> Vec<ValidationError> {
        let op: &Operation = &route.operation;
        let query = req.uri().query().map(query_pairs).unwrap_or_default();
        let cookies = cookie_pairs(req);
        let validator = self.schema_validator();

        let mut errors = Vec::new();
        let mut missing = Vec::new();
        for param in &op.parameters {
            let raws: Vec<String> = match param.location {
                ParameterLocation::Path => route
                    .get_path_param(&param.name)
                    .map(str::to_string)
                    .into_iter()
                    .collect(),
                ParameterLocation::Query => lookup_all(&query, &param.name),
                ParameterLocation::Cookie => lookup_all(&cookies, &param.name),
                ParameterLocation::Header => req
                    .headers()
                    .get_all(param.name.as_str())
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .map(str::to_string)
                    .collect(),
            };
            if raws.is_empty() {
                if param.required {
                    missing.push(param.name.as_str());
                }
                continue;
            }
            let Some(schema) = param.schema else {
                continue;
            };
            let instance = self.param_instance(param, schema, &raws);
            let prefix = format!("/{}/{}", param.location, escape_token(&param.name));
            errors.extend(validator.validate(schema, &instance).into_iter().map(|mut e| {
                e.instance_path = format!("{prefix}{}", e.instance_path);
                e
            }));
        }
        if !missing.is_empty() {
            errors.insert(
                0,
                ValidationError::new(
                    ValidationErrorKind::MissingRequired,
                    format!("{}/parameters", op.pointer),
                    "",
                    format!("missing required parameters: {}", missing.join(", ")),
                ),
            );
        }
        errors
    }

    /// Build the JSON instance for a parameter's raw string values.
    fn param_instance(&self, param: &ParameterMeta, schema: SchemaId, raws: &[String]) -> Value {
        let coerce = self.config.coerce_params;
        let kind = self.doc.resolve(schema).map(|s| &s.kind);
        if let Some(SchemaKind::Array { items }) = kind {
            let item_kind = items.and_then(|id| self.doc.resolve(id)).map(|s| &s.kind);
            // simple style: a single value carries comma separated items
            let values: Vec<&str> = if raws.len() == 1 && param.location != ParameterLocation::Query {
                raws[0].split(',').collect()
            } else {
                raws.iter().map(String::as_str).collect()
            };
            return Value::Array(
                values
                    .into_iter()
                    .map(|raw| coerce_scalar(item_kind, raw, coerce))
                    .collect(),
            );
        }
        // last value wins for repeated scalars
        let raw = raws.last().map_or("", String::as_str);
        coerce_scalar(kind, raw, coerce)
    }

    fn report(&self, errors: &[ValidationError]) {
        if let Some(handler) = &self.error_handler {
            for error in errors {
                handler(error);
            }
        }
    }

    fn render(&self, status: StatusCode, id: &str, errors: &[ValidationError]) -> ApiResponse {
        self.renderer
            .render(status, id, &join_messages(errors))
            .into_response()
    }

    fn request_failure(
        &self,
        req: &ApiRequest,
        errors: Vec<ValidationError>,
        status: StatusCode,
        id: &str,
    ) -> Result<Option<ApiResponse>, MiddlewareError> {
        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            error_count = errors.len(),
            errors = %join_messages(&errors),
            "Request validation failed"
        );
        self.report(&errors);
        if self.request_raise.fires(&errors) {
            return Err(MiddlewareError::RequestInvalid {
                method: req.method().clone(),
                path: req.uri().path().to_string(),
                errors,
            });
        }
        if self.config.request.ignore_error {
            return Ok(None);
        }
        Ok(Some(self.render(status, id, &errors)))
    }
}

impl Middleware for ValidationMiddleware {
    fn before(&self, req: &mut ApiRequest) -> Result<Option<ApiResponse>, MiddlewareError> {
        match self.validate_request(req) {
            RequestVerdict::Undocumented => Ok(None),
            RequestVerdict::Valid(route) => {
                req.extensions_mut().insert(route);
                Ok(None)
            }
            RequestVerdict::NotFound(errors) => {
                self.request_failure(req, errors, StatusCode::NOT_FOUND, "not_found")
            }
            RequestVerdict::Invalid(route, errors) => {
                let outcome =
                    self.request_failure(req, errors, StatusCode::BAD_REQUEST, "bad_request")?;
                if outcome.is_none() {
                    req.extensions_mut().insert(route);
                }
                Ok(outcome)
            }
        }
    }

    fn after(
        &self,
        req: &ApiRequest,
        res: &mut ApiResponse,
        _latency: Duration,
    ) -> Result<(), MiddlewareError> {
        if !self.config.response.enabled {
            return Ok(());
        }
        let Some(route) = req.extensions().get::<RouteMatch>() else {
            return Ok(());
        };
        let errors = self.validate_response(route, res);
        if errors.is_empty() {
            return Ok(());
        }

        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            operation = %route.operation.label(),
            status = res.status().as_u16(),
            error_count = errors.len(),
            errors = %join_messages(&errors),
            "Response validation failed"
        );
        self.report(&errors);
        if self.response_raise.fires(&errors) {
            return Err(MiddlewareError::ResponseInvalid {
                method: req.method().clone(),
                path: req.uri().path().to_string(),
                errors,
            });
        }
        if !self.config.response.ignore_error {
            *res = self.render(StatusCode::INTERNAL_SERVER_ERROR, "invalid_response", &errors);
        }
        Ok(())
    }
}

/// Media type of a `Content-Type` header, lowercased and without parameters.
fn media_type(headers: &http::HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let media = value.split(';').next().unwrap_or_default().trim();
    if media.is_empty() {
        None
    } else {
        Some(media.to_ascii_lowercase())
    }
}

fn media_matches(content_type: &str, declared: &[String]) -> bool {
    declared.iter().any(|d| {
        let d = d.split(';').next().unwrap_or_default().trim();
        d == "*/*"
            || d.eq_ignore_ascii_case(content_type)
            || d.strip_suffix("/*").is_some_and(|major| {
                content_type
                    .split('/')
                    .next()
                    .is_some_and(|m| m.eq_ignore_ascii_case(major))
            })
    })
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn cookie_pairs(req: &ApiRequest) -> Vec<(String, String)> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            Some((k.to_string(), v.to_string()))
        })
        .collect()
}

fn lookup_all(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .collect()
}

fn coerce_scalar(kind: Option<&SchemaKind>, raw: &str, coerce: bool) -> Value {
    if !coerce {
        return Value::String(raw.to_string());
    }
    match kind {
        Some(SchemaKind::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(SchemaKind::Number) => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| Value::String(raw.to_string()), Value::Number),
        Some(SchemaKind::Boolean) => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}
