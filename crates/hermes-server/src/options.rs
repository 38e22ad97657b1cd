//! Router construction options.

use std::fmt;
use std::sync::Arc;

use crate::cors::CorsConfig;
use crate::handler::Middleware;
use crate::request::ServerRequest;
use crate::response::ServerResponse;
use crate::router::PipelineError;

/// A user hook consulted before the default error handling.
///
/// Returning `Some(response)` replaces the default response for that error;
/// returning `None` falls through to the default taxonomy.
pub type ErrorHook =
    Arc<dyn Fn(&PipelineError, &ServerRequest) -> Option<ServerResponse> + Send + Sync>;

/// Options controlling a router's pipeline behavior.
///
/// # Example
///
/// ```
/// use hermes_server::{CorsConfig, RouterOptions};
///
/// let options = RouterOptions::new()
///     .base_path("/api/v1")
///     .json_query()
///     .validate_responses()
///     .cors(CorsConfig::new());
/// # let _ = options;
/// ```
#[derive(Clone, Default)]
pub struct RouterOptions {
    base_path: Option<String>,
    json_query: bool,
    validate_responses: bool,
    cors: Option<CorsConfig>,
    error_hook: Option<ErrorHook>,
    middleware: Vec<Middleware>,
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("base_path", &self.base_path)
            .field("json_query", &self.json_query)
            .field("validate_responses", &self.validate_responses)
            .field("cors", &self.cors)
            .field("error_hook", &self.error_hook.is_some())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

impl RouterOptions {
    /// Creates the default options: no base path, raw query strings, no
    /// response validation, no CORS.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts every route under a path prefix. Requests outside the prefix
    /// are a deployment error, not a 404.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Leniently JSON-parses raw query values before the schema check, so
    /// numbers and booleans keep their types across the wire.
    #[must_use]
    pub fn json_query(mut self) -> Self {
        self.json_query = true;
        self
    }

    /// Validates handler responses against their declared schemas before
    /// emitting them.
    #[must_use]
    pub fn validate_responses(mut self) -> Self {
        self.validate_responses = true;
        self
    }

    /// Enables cross-origin handling with the given policy.
    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Installs an error hook consulted before the default error handling.
    #[must_use]
    pub fn error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Appends a middleware that runs, in registration order, on every
    /// request before routing.
    #[must_use]
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub(crate) fn base_path_ref(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    pub(crate) fn json_query_enabled(&self) -> bool {
        self.json_query
    }

    pub(crate) fn validate_responses_enabled(&self) -> bool {
        self.validate_responses
    }

    pub(crate) fn cors_ref(&self) -> Option<&CorsConfig> {
        self.cors.as_ref()
    }

    pub(crate) fn error_hook_ref(&self) -> Option<&ErrorHook> {
        self.error_hook.as_ref()
    }

    pub(crate) fn middleware_slice(&self) -> &[Middleware] {
        &self.middleware
    }
}
