//! The contract-bound router.
//!
//! [`Router::bind`] zips an implementation tree against a contract tree,
//! failing fast on any shape mismatch, and produces a flat route table.
//! [`Router::handle`] then runs the request pipeline: policy (base path,
//! preflight, body evaluation), global middleware, matching, per-route
//! middleware, the schema gate, the handler, and response shaping. Every
//! failure along the way is converted to a wire response by the error
//! taxonomy; `handle` itself never fails.

use std::collections::HashSet;

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use hermes_core::path::match_path;
use hermes_core::{
    BindError, Contract, ContractNode, HttpError, RequestValidationError,
    ResponseValidationError, RouteError,
};

use crate::handler::{Middleware, MiddlewareOutcome, ResponseHeaders, RouteContext, RouteHandler};
use crate::options::RouterOptions;
use crate::request::ServerRequest;
use crate::response::ServerResponse;
use crate::shape::shape_response;
use crate::validate::validate_request;

/// One node of an implementation tree, mirroring the contract tree's shape.
pub enum ImplNode {
    /// A bare handler for a route leaf.
    Handler(RouteHandler),
    /// A handler plus route-scoped middleware.
    Route {
        /// The handler.
        handler: RouteHandler,
        /// Middleware run after matching, before validation.
        middleware: Vec<Middleware>,
    },
    /// A nested namespace, mirroring a nested contract.
    Router(IndexMap<String, ImplNode>),
}

/// Builder for an implementation tree.
///
/// # Example
///
/// ```no_run
/// use hermes_server::{handler_fn, HandlerResponse, ImplRouter};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let implementation = ImplRouter::new().handler(
///     "health",
///     handler_fn(|_request, _ctx| async move {
///         Ok(HandlerResponse::json(StatusCode::OK, json!({"ok": true})))
///     }),
/// );
/// # let _ = implementation;
/// ```
#[derive(Default)]
pub struct ImplRouter {
    routes: IndexMap<String, ImplNode>,
}

impl ImplRouter {
    /// Creates an empty implementation tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Implements the route leaf at `key`.
    #[must_use]
    pub fn handler(mut self, key: impl Into<String>, handler: RouteHandler) -> Self {
        self.routes.insert(key.into(), ImplNode::Handler(handler));
        self
    }

    /// Implements the route leaf at `key` with route-scoped middleware.
    #[must_use]
    pub fn route(
        mut self,
        key: impl Into<String>,
        handler: RouteHandler,
        middleware: Vec<Middleware>,
    ) -> Self {
        self.routes
            .insert(key.into(), ImplNode::Route { handler, middleware });
        self
    }

    /// Nests a sub-tree at `key`, mirroring a nested contract.
    #[must_use]
    pub fn router(mut self, key: impl Into<String>, nested: Self) -> Self {
        self.routes.insert(key.into(), ImplNode::Router(nested.routes));
        self
    }
}

/// Everything that can go wrong while serving one request.
///
/// This is what the error hook sees; the default handling maps each variant
/// to its wire shape.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request failed a declared schema (400).
    #[error(transparent)]
    RequestValidation(#[from] RequestValidationError),

    /// A handler's response failed its declared schema (500).
    #[error(transparent)]
    ResponseValidation(#[from] ResponseValidationError),

    /// A handler or middleware failure, deliberate or unexpected.
    #[error(transparent)]
    Route(#[from] RouteError),
}

struct BoundRoute {
    key_path: String,
    leaf: std::sync::Arc<hermes_core::RouteLeaf>,
    handler: RouteHandler,
    middleware: Vec<Middleware>,
    literal_segments: usize,
}

/// A contract-bound request pipeline.
pub struct Router {
    routes: Vec<BoundRoute>,
    options: RouterOptions,
}

impl Router {
    /// Binds an implementation tree to a contract tree.
    ///
    /// The two trees are walked in lockstep; any shape mismatch (a missing
    /// key, an extra key, a handler where a router belongs, or two leaves
    /// sharing a method and path shape) fails the bind. A process with a
    /// mis-shaped implementation must not start serving.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindError`] encountered, in declaration order.
    pub fn bind(
        contract: &Contract,
        implementation: ImplRouter,
        options: RouterOptions,
    ) -> Result<Self, BindError> {
        let mut routes = Vec::new();
        bind_level(contract, implementation.routes, "", &mut routes)?;

        let mut shapes = HashSet::new();
        for route in &routes {
            let shape = (
                route.leaf.method().clone(),
                route.leaf.path_template(),
            );
            if !shapes.insert(shape) {
                return Err(BindError::DuplicateRoute {
                    method: route.leaf.method().to_string(),
                    path: route.leaf.path().to_string(),
                });
            }
            tracing::debug!(
                key_path = %route.key_path,
                method = %route.leaf.method(),
                path = %route.leaf.path(),
                "route bound"
            );
        }

        Ok(Self { routes, options })
    }

    /// Returns the number of bound routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Serves one request.
    ///
    /// Never fails: every pipeline error is converted to its wire response.
    pub async fn handle(&self, mut request: ServerRequest) -> ServerResponse {
        // A request outside the mount prefix is a deployment error, not a
        // caller mistake.
        let effective_path = match self.options.base_path_ref() {
            Some(base) => match strip_base_path(request.path(), base) {
                Some(stripped) => stripped.to_string(),
                None => {
                    let error = RouteError::unexpected(anyhow::anyhow!(
                        "request path `{}` is outside the base path `{base}`",
                        request.path()
                    ));
                    return self.fail(error.into(), &request);
                }
            },
            None => request.path().to_string(),
        };

        if request.method() == Method::OPTIONS {
            if let Some(cors) = self.options.cors_ref() {
                let response = cors.preflight(&request);
                request.mark_preflight_cors_applied();
                return self.finalize(response, &request);
            }
        }

        self.evaluate_content(&mut request);

        for middleware in self.options.middleware_slice() {
            match middleware(request.clone()).await {
                Ok(MiddlewareOutcome::Continue(next)) => request = next,
                Ok(MiddlewareOutcome::Respond(response)) => {
                    return self.finalize(response, &request)
                }
                Err(error) => return self.fail(error.into(), &request),
            }
        }

        let Some((route, params)) = self.match_route(request.method(), &effective_path) else {
            return self.fail(RouteError::from(HttpError::not_found()).into(), &request);
        };
        request.set_params(params);

        for middleware in &route.middleware {
            match middleware(request.clone()).await {
                Ok(MiddlewareOutcome::Continue(next)) => request = next,
                Ok(MiddlewareOutcome::Respond(response)) => {
                    return self.finalize(response, &request)
                }
                Err(error) => return self.fail(error.into(), &request),
            }
        }

        let validated =
            match validate_request(&request, &route.leaf, self.options.json_query_enabled()) {
                Ok(validated) => validated,
                Err(error) => return self.fail(error.into(), &request),
            };

        let response_headers = ResponseHeaders::new();
        let context = RouteContext::new(
            route.leaf.clone(),
            request.clone(),
            response_headers.clone(),
        );

        let produced = match (route.handler)(validated, context).await {
            Ok(produced) => produced,
            Err(error) => return self.fail(error.into(), &request),
        };

        let mut response = match shape_response(
            &route.leaf,
            produced,
            self.options.validate_responses_enabled(),
        ) {
            Ok(response) => response,
            Err(error) => return self.fail(error.into(), &request),
        };

        response_headers.apply_to(&mut response);
        self.finalize(response, &request)
    }

    fn match_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&BoundRoute, serde_json::Map<String, Value>)> {
        // Among all matching shapes, the one with the most literal segments
        // wins, so `/users/me` beats `/users/:id` regardless of declaration
        // order.
        self.routes
            .iter()
            .filter(|route| route.leaf.method() == method)
            .filter_map(|route| {
                match_path(route.leaf.path(), path).map(|params| (route, params))
            })
            .max_by_key(|(route, _)| route.literal_segments)
    }

    /// Parses the raw body into structured content by content type.
    ///
    /// A JSON content type with an unparseable body leaves the content
    /// unset rather than failing here. Routes that declare a body schema
    /// then report it as a 400 validation failure, and routes without one
    /// keep accepting the raw bytes.
    fn evaluate_content(&self, request: &mut ServerRequest) {
        if matches!(*request.method(), Method::GET | Method::HEAD) || request.body().is_empty() {
            return;
        }
        let content_type = request.content_type().unwrap_or("").to_string();
        if content_type.contains("json") {
            if let Ok(content) = serde_json::from_slice::<Value>(request.body()) {
                request.set_content(content);
            }
        } else if content_type.starts_with("text/") {
            let text = String::from_utf8_lossy(request.body()).into_owned();
            request.set_content(Value::String(text));
        }
    }

    fn fail(&self, error: PipelineError, request: &ServerRequest) -> ServerResponse {
        if let Some(hook) = self.options.error_hook_ref() {
            if let Some(response) = hook(&error, request) {
                return self.finalize(response, request);
            }
        }

        let response = match error {
            PipelineError::RequestValidation(error) => ServerResponse::from(HttpError::new(
                http::StatusCode::BAD_REQUEST,
                error.to_body(),
            )),
            PipelineError::ResponseValidation(error) => {
                tracing::error!(
                    method = %error.method,
                    path = %error.path,
                    status = error.status,
                    cause = %error.cause,
                    "response failed its declared schema"
                );
                ServerResponse::from(HttpError::server_error())
            }
            PipelineError::Route(RouteError::Http(error)) => ServerResponse::from(error),
            PipelineError::Route(RouteError::Unexpected(error)) => {
                if self.options.error_hook_ref().is_none() {
                    tracing::error!(error = %error, "unexpected handler failure");
                }
                ServerResponse::from(HttpError::server_error())
            }
        };
        self.finalize(response, request)
    }

    fn finalize(&self, mut response: ServerResponse, request: &ServerRequest) -> ServerResponse {
        if let Some(cors) = self.options.cors_ref() {
            if !request.preflight_cors_applied() {
                cors.corsify(request, &mut response);
            }
        }
        response
    }
}

fn bind_level(
    contract: &Contract,
    mut implementation: IndexMap<String, ImplNode>,
    prefix: &str,
    out: &mut Vec<BoundRoute>,
) -> Result<(), BindError> {
    for (key, node) in contract.iter() {
        let key_path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };

        let Some(implemented) = implementation.shift_remove(key) else {
            return Err(BindError::MissingKey { key_path });
        };

        match (node, implemented) {
            (ContractNode::Route(leaf), ImplNode::Handler(handler)) => {
                out.push(bound_route(key_path, leaf.clone(), handler, Vec::new()));
            }
            (ContractNode::Route(leaf), ImplNode::Route { handler, middleware }) => {
                out.push(bound_route(key_path, leaf.clone(), handler, middleware));
            }
            (ContractNode::Router(nested), ImplNode::Router(routes)) => {
                bind_level(nested, routes, &key_path, out)?;
            }
            (ContractNode::Route(_), ImplNode::Router(_)) => {
                return Err(BindError::ExpectedHandler { key_path });
            }
            (ContractNode::Router(_), _) => {
                return Err(BindError::ExpectedRouter { key_path });
            }
        }
    }

    if let Some((key, _)) = implementation.into_iter().next() {
        let key_path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        return Err(BindError::UnexpectedKey { key_path });
    }

    Ok(())
}

fn bound_route(
    key_path: String,
    leaf: std::sync::Arc<hermes_core::RouteLeaf>,
    handler: RouteHandler,
    middleware: Vec<Middleware>,
) -> BoundRoute {
    let literal_segments = leaf
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with(':'))
        .count();
    BoundRoute {
        key_path,
        leaf,
        handler,
        middleware,
        literal_segments,
    }
}

fn strip_base_path<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
