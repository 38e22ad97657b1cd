//! Handler and middleware signatures.
//!
//! A route handler receives the request only after every declared schema has
//! passed, as a [`ValidatedRequest`] of checked values. It returns a
//! [`HandlerResponse`] naming a status and a payload; the shaping layer then
//! reconciles that against the route's declared responses.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use hermes_core::{RouteError, RouteLeaf};

use crate::request::ServerRequest;
use crate::response::ServerResponse;

/// A boxed future, the return shape of type-erased handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The checked request parts a handler receives.
///
/// Every field holds the schema check's output value, so coercions declared
/// in the contract (string params coerced to integers, JSON-query typing)
/// are already applied.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Checked path params.
    pub params: Value,
    /// Checked query values.
    pub query: Value,
    /// Checked body, or `Value::Null` for routes without a body schema.
    pub body: Value,
    /// Checked headers.
    pub headers: Value,
}

/// The payload a handler produces.
#[derive(Debug, Clone)]
pub enum HandlerBody {
    /// A JSON document, validated against the declared response schema.
    Json(Value),
    /// An opaque payload for routes declaring a non-JSON response.
    Blob {
        /// The payload bytes.
        bytes: Bytes,
        /// Overrides the declared content type when set.
        content_type: Option<String>,
    },
}

/// What a handler returns on success: a status and a payload.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    /// Status code to emit.
    pub status: StatusCode,
    /// Payload to shape against the route's declared responses.
    pub body: HandlerBody,
}

impl HandlerResponse {
    /// Creates a JSON response.
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: HandlerBody::Json(body),
        }
    }

    /// Creates an opaque payload response with the route's declared content
    /// type.
    #[must_use]
    pub fn blob(status: StatusCode, bytes: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: HandlerBody::Blob {
                bytes: bytes.into(),
                content_type: None,
            },
        }
    }

    /// Creates an opaque payload response with an explicit content type.
    #[must_use]
    pub fn blob_with_content_type(
        status: StatusCode,
        bytes: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: HandlerBody::Blob {
                bytes: bytes.into(),
                content_type: Some(content_type.into()),
            },
        }
    }
}

/// Response headers a handler can set while the response is still being
/// shaped.
///
/// Cheap to clone; all clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    inner: Arc<Mutex<HeaderMap>>,
}

impl ResponseHeaders {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any prior value. Invalid values are dropped.
    pub fn set(&self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.lock().insert(name, value);
        }
    }

    /// Appends a value to a header, preserving prior values.
    pub fn append(&self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.lock().append(name, value);
        }
    }

    pub(crate) fn apply_to(&self, response: &mut ServerResponse) {
        for (name, value) in self.lock().iter() {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeaderMap> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Per-invocation context passed to handlers alongside the validated parts.
#[derive(Clone)]
pub struct RouteContext {
    route: Arc<RouteLeaf>,
    request: ServerRequest,
    response_headers: ResponseHeaders,
}

impl RouteContext {
    pub(crate) fn new(
        route: Arc<RouteLeaf>,
        request: ServerRequest,
        response_headers: ResponseHeaders,
    ) -> Self {
        Self {
            route,
            request,
            response_headers,
        }
    }

    /// The contract declaration of the route being served.
    #[must_use]
    pub fn route(&self) -> &Arc<RouteLeaf> {
        &self.route
    }

    /// The raw inbound request, including extensions set by the host or by
    /// middleware.
    #[must_use]
    pub fn request(&self) -> &ServerRequest {
        &self.request
    }

    /// Headers to merge into the final response.
    #[must_use]
    pub fn response_headers(&self) -> &ResponseHeaders {
        &self.response_headers
    }
}

/// A type-erased async route handler.
pub type RouteHandler = Arc<
    dyn Fn(ValidatedRequest, RouteContext) -> BoxFuture<'static, Result<HandlerResponse, RouteError>>
        + Send
        + Sync,
>;

/// Wraps an async closure as a [`RouteHandler`].
///
/// # Example
///
/// ```
/// use hermes_server::{handler_fn, HandlerResponse};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let handler = handler_fn(|request, _ctx| async move {
///     Ok(HandlerResponse::json(
///         StatusCode::OK,
///         json!({"echo": request.query}),
///     ))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> RouteHandler
where
    F: Fn(ValidatedRequest, RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerResponse, RouteError>> + Send + 'static,
{
    Arc::new(move |request, context| Box::pin(f(request, context)))
}

/// What a middleware decides about the request it received.
#[derive(Debug)]
pub enum MiddlewareOutcome {
    /// Keep going with this (possibly mutated) request.
    Continue(ServerRequest),
    /// Stop here and emit this response; neither later middleware nor the
    /// route handler runs.
    Respond(ServerResponse),
}

/// A type-erased async middleware.
///
/// A middleware owns the request while it runs: it may mutate headers or
/// extensions and hand it back with
/// [`Continue`](MiddlewareOutcome::Continue), or short-circuit with
/// [`Respond`](MiddlewareOutcome::Respond).
pub type Middleware = Arc<
    dyn Fn(ServerRequest) -> BoxFuture<'static, Result<MiddlewareOutcome, RouteError>>
        + Send
        + Sync,
>;

/// Wraps an async closure as a [`Middleware`].
///
/// # Example
///
/// ```
/// use hermes_server::{middleware_fn, MiddlewareOutcome};
///
/// let trace = middleware_fn(|mut request| async move {
///     request.extensions_mut().insert("request-id-1".to_string());
///     Ok(MiddlewareOutcome::Continue(request))
/// });
/// # let _ = trace;
/// ```
pub fn middleware_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(ServerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MiddlewareOutcome, RouteError>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}
