//! The contract-driven dispatcher.
//!
//! A [`Client`] holds the base URL, base headers and transport; binding it to
//! a [`Contract`] walks the tree once and yields a [`ContractClient`] that
//! dispatches calls by dotted key path. The URL is assembled from the leaf's
//! path template and the call's params and query; the body is encoded the way
//! the leaf declares.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use hermes_core::query::encode_query;
use hermes_core::{path, Contract, ResponseKind, RouteLeaf};
use hermes_schema::{check, CheckOptions};

use crate::error::ClientError;
use crate::transport::{
    HttpTransport, MultipartPart, Transport, TransportBody, TransportRequest,
};

/// Configuration for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    base_headers: Vec<(String, String)>,
    validate_responses: bool,
}

impl ClientConfig {
    /// Creates a config for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            base_headers: Vec::new(),
            validate_responses: false,
        }
    }

    /// Adds a header sent on every call. Per-call headers with the same name
    /// win.
    #[must_use]
    pub fn base_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_headers.push((name.into(), value.into()));
        self
    }

    /// Validates JSON responses against the schema the contract declares for
    /// their status.
    #[must_use]
    pub fn validate_responses(mut self) -> Self {
        self.validate_responses = true;
        self
    }
}

/// Arguments for one call: params, query, headers and body.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    params: Map<String, Value>,
    query: Value,
    headers: Vec<(String, String)>,
    body: TransportBody,
}

impl CallArgs {
    /// Creates empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one path param.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the query object, serialized with the canonical query encoding.
    #[must_use]
    pub fn query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Adds a per-call header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body. For routes declaring `multipart/form-data`, the
    /// object is converted to form fields instead.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = TransportBody::Json(body);
        self
    }

    /// Sets an explicit multipart body.
    #[must_use]
    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = TransportBody::Multipart(parts);
        self
    }
}

/// What a call produced.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ClientResponse {
    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the body as UTF-8 text, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A configured HTTP client, not yet bound to any contract.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client over the default `reqwest` transport.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Creates a client over a custom transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Binds the client to a contract, indexing every route leaf by its
    /// dotted key path.
    #[must_use]
    pub fn bind(&self, contract: &Contract) -> ContractClient {
        let mut routes = IndexMap::new();
        contract.walk(&mut |key_path, leaf| {
            routes.insert(key_path.to_string(), leaf.clone());
        });
        ContractClient {
            client: self.clone(),
            routes,
        }
    }
}

/// A client bound to one contract tree.
#[derive(Clone)]
pub struct ContractClient {
    client: Client,
    routes: IndexMap<String, Arc<RouteLeaf>>,
}

impl ContractClient {
    /// Returns the number of callable routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Calls the route leaf at `key_path` (e.g. `posts.getPost`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownRoute`] for an unindexed key path,
    /// transport and decode failures, and, when response validation is
    /// enabled, [`ClientError::ResponseValidation`].
    pub async fn call(
        &self,
        key_path: &str,
        args: CallArgs,
    ) -> Result<ClientResponse, ClientError> {
        let Some(leaf) = self.routes.get(key_path) else {
            return Err(ClientError::UnknownRoute {
                key_path: key_path.to_string(),
            });
        };

        let request = self.assemble(leaf, args);
        tracing::debug!(key_path, method = %request.method, url = %request.url, "dispatching call");

        let response = self.client.transport.send(request).await?;
        let response = ClientResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        };

        if self.client.config.validate_responses {
            self.validate(leaf, &response)?;
        }
        Ok(response)
    }

    fn assemble(&self, leaf: &RouteLeaf, args: CallArgs) -> TransportRequest {
        let config = &self.client.config;
        let base = config.base_url.trim_end_matches('/');
        let url = format!(
            "{base}{}{}",
            path::insert_params(leaf.path(), &args.params),
            encode_query(&args.query)
        );

        let mut headers = HeaderMap::new();
        for (name, value) in config.base_headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
            .chain(args.headers.iter().map(|(n, v)| (n.as_str(), v.as_str())))
        {
            if let (Ok(name), Ok(value)) =
                (name.parse::<HeaderName>(), HeaderValue::from_str(value))
            {
                headers.insert(name, value);
            }
        }

        let body = if leaf.method() == Method::GET {
            TransportBody::None
        } else {
            match args.body {
                TransportBody::Json(value) if is_multipart(leaf) => {
                    TransportBody::Multipart(form_fields(&value))
                }
                other => other,
            }
        };

        TransportRequest {
            method: leaf.method().clone(),
            url,
            headers,
            body,
        }
    }

    fn validate(&self, leaf: &RouteLeaf, response: &ClientResponse) -> Result<(), ClientError> {
        let Some(ResponseKind::Body(schema)) = leaf.response(response.status.as_u16()) else {
            return Ok(());
        };
        let value = response.json()?;
        check(Some(schema), &value, &CheckOptions::default()).map_err(|cause| {
            ClientError::ResponseValidation {
                method: leaf.method().to_string(),
                path: leaf.path().to_string(),
                status: response.status.as_u16(),
                cause,
            }
        })?;
        Ok(())
    }
}

fn is_multipart(leaf: &RouteLeaf) -> bool {
    leaf.content_type()
        .is_some_and(|content_type| content_type.starts_with("multipart/form-data"))
}

/// Converts a JSON object into multipart form fields.
///
/// Every value is serialized as JSON text under its own field name, strings
/// and arrays included, so the server can parse each field back without
/// guessing its type. Null values are omitted.
fn form_fields(body: &Value) -> Vec<MultipartPart> {
    let Some(object) = body.as_object() else {
        return Vec::new();
    };

    object
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| MultipartPart::text(name.as_str(), value.to_string()))
        .collect()
}
