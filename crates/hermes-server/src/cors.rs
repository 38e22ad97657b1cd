//! Cross-origin policy.
//!
//! One [`CorsConfig`] drives both halves of the protocol: preflight OPTIONS
//! requests are answered before routing, and every routed response is
//! decorated with the allow-origin headers on the way out.

use std::fmt;
use std::sync::Arc;

use http::{header, Method, StatusCode};
use regex::Regex;

use crate::request::ServerRequest;
use crate::response::ServerResponse;

/// How allowed origins are decided.
#[derive(Clone)]
pub enum CorsOrigin {
    /// Any origin. Emits a literal `*` unless credentials are enabled, in
    /// which case the request origin is echoed back.
    Any,
    /// Exactly one origin, emitted verbatim.
    Exact(String),
    /// An explicit allow-list; the request origin is echoed when listed.
    List(Vec<String>),
    /// Origins matching a pattern are echoed.
    Pattern(Regex),
    /// Origins accepted by a predicate are echoed.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for CorsOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Exact(origin) => f.debug_tuple("Exact").field(origin).finish(),
            Self::List(origins) => f.debug_tuple("List").field(origins).finish(),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Cross-origin policy for a router.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    origin: CorsOrigin,
    allow_methods: Vec<Method>,
    allow_headers: Option<Vec<String>>,
    expose_headers: Vec<String>,
    credentials: bool,
    max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: CorsOrigin::Any,
            allow_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allow_headers: None,
            expose_headers: Vec::new(),
            credentials: false,
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Creates the permissive default policy (`*`, common methods).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the origin policy.
    #[must_use]
    pub fn origin(mut self, origin: CorsOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the methods announced on preflight.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allow_methods = methods.into_iter().collect();
        self
    }

    /// Sets the headers announced on preflight. When unset, the headers the
    /// browser asked for are echoed back.
    #[must_use]
    pub fn allow_headers<S: Into<String>>(
        mut self,
        headers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allow_headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the response headers exposed to cross-origin callers.
    #[must_use]
    pub fn expose_headers<S: Into<String>>(
        mut self,
        headers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Enables `Access-Control-Allow-Credentials`.
    #[must_use]
    pub fn credentials(mut self) -> Self {
        self.credentials = true;
        self
    }

    /// Sets `Access-Control-Max-Age` in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Answers a preflight OPTIONS request: 204, no body, the full
    /// allow-header set.
    pub(crate) fn preflight(&self, request: &ServerRequest) -> ServerResponse {
        let mut response = ServerResponse::new(StatusCode::NO_CONTENT);
        self.apply_origin(request, &mut response);

        let methods = self
            .allow_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        response.set_header(header::ACCESS_CONTROL_ALLOW_METHODS, &methods);

        match &self.allow_headers {
            Some(headers) => {
                response.set_header(header::ACCESS_CONTROL_ALLOW_HEADERS, &headers.join(", "));
            }
            // Echo what the browser asked for, and tell caches the answer
            // depends on it.
            None => {
                if let Some(requested) = request.header(&header::ACCESS_CONTROL_REQUEST_HEADERS) {
                    let requested = requested.to_string();
                    response.set_header(header::ACCESS_CONTROL_ALLOW_HEADERS, &requested);
                }
                response.append_header(
                    header::VARY,
                    header::ACCESS_CONTROL_REQUEST_HEADERS.as_str(),
                );
            }
        }

        if let Some(max_age) = self.max_age {
            response.set_header(header::ACCESS_CONTROL_MAX_AGE, &max_age.to_string());
        }
        if self.credentials {
            response.set_header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
        }

        response
    }

    /// Decorates a routed response with the allow-origin headers.
    pub(crate) fn corsify(&self, request: &ServerRequest, response: &mut ServerResponse) {
        self.apply_origin(request, response);
        if self.credentials {
            response.set_header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
        }
        if !self.expose_headers.is_empty() {
            response.set_header(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                &self.expose_headers.join(", "),
            );
        }
    }

    fn apply_origin(&self, request: &ServerRequest, response: &mut ServerResponse) {
        if let Some(origin) = self.resolve_origin(request) {
            response.set_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, &origin);
        }
        // Dynamic origins make the response cache-sensitive to Origin.
        if self.is_dynamic() {
            response.append_header(header::VARY, "Origin");
        }
    }

    fn resolve_origin(&self, request: &ServerRequest) -> Option<String> {
        let request_origin = request.header(&header::ORIGIN);
        match &self.origin {
            CorsOrigin::Any if self.credentials => request_origin.map(str::to_string),
            CorsOrigin::Any => Some("*".to_string()),
            CorsOrigin::Exact(origin) => Some(origin.clone()),
            CorsOrigin::List(origins) => request_origin
                .filter(|origin| origins.iter().any(|allowed| allowed == origin))
                .map(str::to_string),
            CorsOrigin::Pattern(pattern) => request_origin
                .filter(|origin| pattern.is_match(origin))
                .map(str::to_string),
            CorsOrigin::Predicate(accept) => request_origin
                .filter(|origin| accept(origin))
                .map(str::to_string),
        }
    }

    fn is_dynamic(&self) -> bool {
        match &self.origin {
            CorsOrigin::Any => self.credentials,
            CorsOrigin::Exact(_) => false,
            CorsOrigin::List(_) | CorsOrigin::Pattern(_) | CorsOrigin::Predicate(_) => true,
        }
    }
}
