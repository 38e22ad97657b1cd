//! The host-neutral inbound request.
//!
//! A host adapter (whatever owns the network listener) converts its native
//! request into a [`ServerRequest`] and hands it to
//! [`Router::handle`](crate::Router::handle). The policy layer fills in
//! `content`; the router fills in `params` once a route matches.

use bytes::Bytes;
use http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::{Map, Value};

use hermes_core::query::decode_query;

/// An inbound HTTP request in the shape the pipeline consumes.
#[derive(Debug, Default, Clone)]
pub struct ServerRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Map<String, Value>,
    params: Map<String, Value>,
    body: Bytes,
    content: Option<Value>,
    preflight_cors_applied: bool,
    extensions: Extensions,
}

impl ServerRequest {
    /// Starts building a request for the given method and path.
    ///
    /// A query string in `path` is split off and decoded with the canonical
    /// query codec.
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> ServerRequestBuilder {
        ServerRequestBuilder::new(method, path)
    }

    /// Convenience constructor for a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> ServerRequestBuilder {
        Self::builder(Method::GET, path)
    }

    /// Convenience constructor for a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> ServerRequestBuilder {
        Self::builder(Method::POST, path)
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns one header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw query values.
    #[must_use]
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Returns the path-match params. Empty until a route matches.
    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the parsed body content, once the policy layer has run.
    #[must_use]
    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    /// Returns the declared content type of the body, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(&header::CONTENT_TYPE)
    }

    /// Host- or middleware-attached extension data.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to extension data, for middleware.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub(crate) fn set_params(&mut self, params: Map<String, Value>) {
        self.params = params;
    }

    pub(crate) fn set_content(&mut self, content: Value) {
        self.content = Some(content);
    }

    pub(crate) fn mark_preflight_cors_applied(&mut self) {
        self.preflight_cors_applied = true;
    }

    pub(crate) fn preflight_cors_applied(&self) -> bool {
        self.preflight_cors_applied
    }
}

/// Builder for [`ServerRequest`].
#[derive(Debug)]
pub struct ServerRequestBuilder {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Map<String, Value>,
    body: Bytes,
    extensions: Extensions,
}

impl ServerRequestBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        let full = path.into();
        let (path, query) = match full.split_once('?') {
            Some((p, q)) => (p.to_string(), decode_query(q)),
            None => (full, Map::new()),
        };

        Self {
            method,
            path,
            headers: HeaderMap::new(),
            query,
            body: Bytes::new(),
            extensions: Extensions::new(),
        }
    }

    /// Adds a header. Invalid names or values are silently dropped; hosts
    /// hand over already-parsed headers in practice.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a raw query value directly (bypassing query-string decoding).
    #[must_use]
    pub fn query_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Sets the raw body bytes.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and the matching content-type header.
    #[must_use]
    pub fn json_body(self, value: &Value) -> Self {
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        self.header("content-type", "application/json").body(bytes)
    }

    /// Attaches host extension data.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Finishes the request.
    #[must_use]
    pub fn build(self) -> ServerRequest {
        ServerRequest {
            method: self.method,
            path: self.path,
            headers: self.headers,
            query: self.query,
            params: Map::new(),
            body: self.body,
            content: None,
            preflight_cors_applied: false,
            extensions: self.extensions,
        }
    }
}
