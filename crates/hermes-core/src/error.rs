//! Error taxonomy shared by every Hermes binding.
//!
//! Five kinds of failure exist in the toolkit, and each has a dedicated type
//! so the server's error handler can dispatch on kind rather than on message
//! text:
//!
//! - [`RequestValidationError`] - inbound request failed a schema check (400)
//! - [`ResponseValidationError`] - a handler's response failed its declared
//!   schema (500, server-side defect)
//! - [`HttpError`] - a deliberate wire-level status signalled by a handler or
//!   synthesized by the pipeline; passed through verbatim
//! - [`RouteError`] - what handlers return: either an [`HttpError`] or an
//!   opaque unexpected error that must never leak to the caller
//! - [`BindError`] - construction-time tree-shape mismatch; raised at
//!   startup, never per-request

use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use hermes_schema::SchemaError;

/// The only error shape the wire boundary understands.
///
/// Carries the exact status, body and content type to emit. Handlers may
/// return one deliberately; the pipeline synthesizes them (404 catch-all,
/// validation failures) and the error handler converts everything else into
/// one.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status}")]
pub struct HttpError {
    /// Status code to emit.
    pub status: StatusCode,
    /// Response body. Serialized as JSON when `content_type` says so,
    /// otherwise rendered as-is.
    pub body: Value,
    /// Content type of the response body.
    pub content_type: String,
}

impl HttpError {
    /// Creates a JSON error with the given status and body.
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            content_type: "application/json".to_string(),
        }
    }

    /// Sets a non-JSON content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The fixed 404 error emitted for unmatched requests.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, json!({"message": "Not Found"}))
    }

    /// The fixed 500 error emitted for unexpected failures. Never carries
    /// internal detail.
    #[must_use]
    pub fn server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"message": "Server Error"}),
        )
    }

    /// Returns `true` if the body should be serialized as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type.contains("json")
    }
}

/// Aggregate of the four per-part request schema failures.
///
/// Each part is `None` when that part of the request passed. Serializes to
/// the wire body of a 400 response, with explicit `null`s for passing parts
/// so callers can always index all four fields.
#[derive(Debug, Clone, Default, Serialize, Error)]
#[error("request validation failed")]
pub struct RequestValidationError {
    /// Path-params failure, if any.
    pub params: Option<SchemaError>,
    /// Headers failure, if any.
    pub headers: Option<SchemaError>,
    /// Query failure, if any.
    pub query: Option<SchemaError>,
    /// Body failure, if any.
    pub body: Option<SchemaError>,
}

impl RequestValidationError {
    /// Returns `true` if every part passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_none()
            && self.headers.is_none()
            && self.query.is_none()
            && self.body.is_none()
    }

    /// Renders the wire body for the 400 response.
    #[must_use]
    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({"message": "Validation Error"}))
    }
}

/// A handler's response failed the schema declared for its status.
///
/// Always a server-side defect: the cause is logged and the caller sees a
/// generic 500, never the invalid value.
#[derive(Debug, Clone, Error)]
#[error("response validation failed for {method} {path} (status {status})")]
pub struct ResponseValidationError {
    /// Method of the offending route.
    pub method: String,
    /// Path template of the offending route.
    pub path: String,
    /// Status code the handler returned.
    pub status: u16,
    /// The underlying schema failure.
    pub cause: SchemaError,
}

/// What route handlers and middleware return on failure.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A deliberate wire-level error; passed through verbatim.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Anything else. Logged server-side, surfaced as a generic 500.
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl RouteError {
    /// Creates a deliberate HTTP error with a JSON body.
    #[must_use]
    pub fn http(status: StatusCode, body: Value) -> Self {
        Self::Http(HttpError::new(status, body))
    }

    /// Wraps an opaque failure that must not leak to the caller.
    #[must_use]
    pub fn unexpected(err: impl Into<anyhow::Error>) -> Self {
        Self::Unexpected(err.into())
    }
}

/// Construction-time failure while binding an implementation tree to a
/// contract tree.
///
/// Raised before any request is served; a process with a mis-shaped
/// implementation must fail to start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    /// The contract has a route leaf where the implementation has a router.
    #[error("expected a route handler at `{key_path}`, found a nested router")]
    ExpectedHandler {
        /// Dotted key path of the mismatch (e.g. `posts.getPost`).
        key_path: String,
    },

    /// The contract has a router where the implementation has a handler.
    #[error("expected a nested router at `{key_path}`, found a route handler")]
    ExpectedRouter {
        /// Dotted key path of the mismatch.
        key_path: String,
    },

    /// The implementation is missing a key the contract declares.
    #[error("missing implementation for `{key_path}`")]
    MissingKey {
        /// Dotted key path of the missing entry.
        key_path: String,
    },

    /// The implementation has a key the contract does not declare.
    #[error("implementation key `{key_path}` does not exist in the contract")]
    UnexpectedKey {
        /// Dotted key path of the unexpected entry.
        key_path: String,
    },

    /// Two leaves registered the same method and path.
    #[error("duplicate route registration for {method} {path}")]
    DuplicateRoute {
        /// HTTP method of the colliding route.
        method: String,
        /// Full path (including base path) of the colliding route.
        path: String,
    },
}
