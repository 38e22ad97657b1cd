//! The declarative contract tree.
//!
//! A [`Contract`] is an ordered mapping from keys to either a [`RouteLeaf`]
//! (one endpoint) or a nested [`Contract`] (a namespace), at arbitrary depth.
//! It is pure declarative data: built once with the builder API, then only
//! ever read. The server binder and the client dispatcher both walk the same
//! tree.
//!
//! # Example
//!
//! ```
//! use hermes_core::{Contract, RouteLeaf};
//! use hermes_schema::Schema;
//!
//! let posts = Contract::builder()
//!     .route(
//!         "getPost",
//!         RouteLeaf::get("/posts/:id")
//!             .response(200, Schema::object([("id", Schema::string())]))
//!             .build(),
//!     )
//!     .route(
//!         "createPost",
//!         RouteLeaf::post("/posts")
//!             .body(Schema::object([("title", Schema::string())]))
//!             .response(201, Schema::object([("id", Schema::string())]))
//!             .build(),
//!     )
//!     .build();
//!
//! let api = Contract::builder().router("posts", posts).build();
//! assert_eq!(api.leaf_count(), 2);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;

use hermes_schema::Schema;

use crate::path;

/// The declared shape of one response status.
#[derive(Debug, Clone)]
pub enum ResponseKind {
    /// A JSON body validated against the schema.
    Body(Schema),
    /// No payload at all (e.g. 204).
    NoBody,
    /// A non-JSON payload with an explicit content type.
    Other {
        /// Content type to emit (e.g. `application/pdf`).
        content_type: String,
        /// Optional schema for the payload, when it is representable.
        schema: Option<Schema>,
    },
}

/// One endpoint's complete declaration.
///
/// A leaf is immutable once built. Query routes (GET) carry an optional query
/// schema; mutation routes (POST/PUT/PATCH/DELETE) may additionally declare a
/// body schema and content type. Path params default to a schema inferred
/// from the `:name` segments of the path.
#[derive(Debug, Clone)]
pub struct RouteLeaf {
    method: Method,
    path: String,
    query: Option<Schema>,
    path_params: Option<Schema>,
    headers: Option<Schema>,
    body: Option<Schema>,
    content_type: Option<String>,
    responses: BTreeMap<u16, ResponseKind>,
    strict_status_codes: bool,
    summary: Option<String>,
    description: Option<String>,
}

impl RouteLeaf {
    /// Starts a GET route declaration.
    #[must_use]
    pub fn get(path: impl Into<String>) -> RouteLeafBuilder {
        RouteLeafBuilder::new(Method::GET, path)
    }

    /// Starts a POST route declaration.
    #[must_use]
    pub fn post(path: impl Into<String>) -> RouteLeafBuilder {
        RouteLeafBuilder::new(Method::POST, path)
    }

    /// Starts a PUT route declaration.
    #[must_use]
    pub fn put(path: impl Into<String>) -> RouteLeafBuilder {
        RouteLeafBuilder::new(Method::PUT, path)
    }

    /// Starts a PATCH route declaration.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> RouteLeafBuilder {
        RouteLeafBuilder::new(Method::PATCH, path)
    }

    /// Starts a DELETE route declaration.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> RouteLeafBuilder {
        RouteLeafBuilder::new(Method::DELETE, path)
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template (with `:name` segments).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query schema, if declared.
    #[must_use]
    pub fn query(&self) -> Option<&Schema> {
        self.query.as_ref()
    }

    /// Returns the path-params schema (declared or inferred from the path).
    ///
    /// `None` means the path has no parameter segments.
    #[must_use]
    pub fn path_params(&self) -> Option<&Schema> {
        self.path_params.as_ref()
    }

    /// Returns the headers schema, if declared.
    #[must_use]
    pub fn headers(&self) -> Option<&Schema> {
        self.headers.as_ref()
    }

    /// Returns the body schema, if declared.
    #[must_use]
    pub fn body(&self) -> Option<&Schema> {
        self.body.as_ref()
    }

    /// Returns the declared request content type, if any (e.g.
    /// `multipart/form-data`).
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the declared response shape for `status`, if any.
    #[must_use]
    pub fn response(&self, status: u16) -> Option<&ResponseKind> {
        self.responses.get(&status)
    }

    /// Returns all declared responses, ordered by status code.
    #[must_use]
    pub fn responses(&self) -> &BTreeMap<u16, ResponseKind> {
        &self.responses
    }

    /// Returns `true` if undeclared status codes are treated as a defect
    /// instead of passing through as untyped JSON.
    #[must_use]
    pub fn strict_status_codes(&self) -> bool {
        self.strict_status_codes
    }

    /// Returns the one-line summary, if any.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the long-form description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the documentation template shape of the path (wildcard runs
    /// in place of parameter segments).
    #[must_use]
    pub fn path_template(&self) -> String {
        path::template(&self.path)
    }
}

/// Builder for [`RouteLeaf`].
#[derive(Debug)]
pub struct RouteLeafBuilder {
    method: Method,
    path: String,
    query: Option<Schema>,
    path_params: Option<Schema>,
    headers: Option<Schema>,
    body: Option<Schema>,
    content_type: Option<String>,
    responses: BTreeMap<u16, ResponseKind>,
    strict_status_codes: bool,
    summary: Option<String>,
    description: Option<String>,
}

impl RouteLeafBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            path_params: None,
            headers: None,
            body: None,
            content_type: None,
            responses: BTreeMap::new(),
            strict_status_codes: false,
            summary: None,
            description: None,
        }
    }

    /// Declares the query schema.
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Overrides the inferred path-params schema.
    #[must_use]
    pub fn path_params(mut self, schema: Schema) -> Self {
        self.path_params = Some(schema);
        self
    }

    /// Declares the headers schema.
    #[must_use]
    pub fn headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    /// Declares the body schema (mutation routes).
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// Declares the request content type (e.g. `multipart/form-data`).
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declares a JSON response body for `status`.
    #[must_use]
    pub fn response(mut self, status: u16, schema: Schema) -> Self {
        self.responses.insert(status, ResponseKind::Body(schema));
        self
    }

    /// Declares a no-body response for `status`.
    #[must_use]
    pub fn no_body_response(mut self, status: u16) -> Self {
        self.responses.insert(status, ResponseKind::NoBody);
        self
    }

    /// Declares a non-JSON response for `status`.
    #[must_use]
    pub fn other_response(mut self, status: u16, content_type: impl Into<String>) -> Self {
        self.responses.insert(
            status,
            ResponseKind::Other {
                content_type: content_type.into(),
                schema: None,
            },
        );
        self
    }

    /// Treats undeclared response status codes as a server-side defect.
    #[must_use]
    pub fn strict_status_codes(mut self) -> Self {
        self.strict_status_codes = true;
        self
    }

    /// Sets the one-line summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the long-form description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> RouteLeaf {
        let path_params = self
            .path_params
            .or_else(|| path::params_schema(&self.path));

        RouteLeaf {
            method: self.method,
            path: self.path,
            query: self.query,
            path_params,
            headers: self.headers,
            body: self.body,
            content_type: self.content_type,
            responses: self.responses,
            strict_status_codes: self.strict_status_codes,
            summary: self.summary,
            description: self.description,
        }
    }
}

/// A node in the contract tree: a route leaf or a nested router.
#[derive(Debug, Clone)]
pub enum ContractNode {
    /// One endpoint.
    Route(Arc<RouteLeaf>),
    /// A nested namespace of endpoints.
    Router(Contract),
}

/// An ordered, arbitrarily nested grouping of route leaves.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    routes: IndexMap<String, ContractNode>,
}

impl Contract {
    /// Creates a new contract builder.
    #[must_use]
    pub fn builder() -> ContractBuilder {
        ContractBuilder::default()
    }

    /// Looks up a direct child by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContractNode> {
        self.routes.get(key)
    }

    /// Iterates over the direct children in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractNode)> {
        self.routes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the contract has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the total number of route leaves at any depth.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }

    /// Visits every route leaf in declaration order, depth first.
    ///
    /// The visitor receives the dotted key path (e.g. `posts.getPost`) and
    /// the leaf.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&str, &Arc<RouteLeaf>),
    {
        self.walk_inner("", visit);
    }

    fn walk_inner<F>(&self, prefix: &str, visit: &mut F)
    where
        F: FnMut(&str, &Arc<RouteLeaf>),
    {
        for (key, node) in &self.routes {
            let key_path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match node {
                ContractNode::Route(leaf) => visit(&key_path, leaf),
                ContractNode::Router(nested) => nested.walk_inner(&key_path, visit),
            }
        }
    }
}

/// Builder for [`Contract`].
#[derive(Debug, Default)]
pub struct ContractBuilder {
    routes: IndexMap<String, ContractNode>,
}

impl ContractBuilder {
    /// Adds a route leaf under `key`.
    #[must_use]
    pub fn route(mut self, key: impl Into<String>, leaf: RouteLeaf) -> Self {
        self.routes
            .insert(key.into(), ContractNode::Route(Arc::new(leaf)));
        self
    }

    /// Nests a sub-contract under `key`.
    #[must_use]
    pub fn router(mut self, key: impl Into<String>, contract: Contract) -> Self {
        self.routes.insert(key.into(), ContractNode::Router(contract));
        self
    }

    /// Finishes the contract.
    #[must_use]
    pub fn build(self) -> Contract {
        Contract {
            routes: self.routes,
        }
    }
}
