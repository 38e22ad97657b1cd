//! The exchange seam.
//!
//! The dispatcher builds a [`TransportRequest`] and hands it to a
//! [`Transport`]; the default [`HttpTransport`] drives `reqwest`, and tests
//! substitute a mock. Everything above this seam is deterministic.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

use crate::error::ClientError;

/// A boxed future, the return shape of type-erased transports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One part of a multipart form body.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// Field content.
    pub content: MultipartContent,
}

impl MultipartPart {
    /// Creates a text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: MultipartContent::Text(value.into()),
        }
    }

    /// Creates a file field.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        data: impl Into<Bytes>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: MultipartContent::Bytes {
                data: data.into(),
                file_name: Some(file_name.into()),
                content_type: Some(content_type.into()),
            },
        }
    }
}

/// Content of one multipart field.
#[derive(Debug, Clone)]
pub enum MultipartContent {
    /// A plain text value.
    Text(String),
    /// Raw bytes, optionally named and typed.
    Bytes {
        /// The bytes.
        data: Bytes,
        /// File name announced to the server.
        file_name: Option<String>,
        /// Content type of the part.
        content_type: Option<String>,
    },
}

/// The request body, tagged by how the transport should encode it.
#[derive(Debug, Clone, Default)]
pub enum TransportBody {
    /// No body.
    #[default]
    None,
    /// A JSON document.
    Json(Value),
    /// A multipart form.
    Multipart(Vec<MultipartPart>),
}

/// A fully assembled outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, params substituted and query appended.
    pub url: String,
    /// Merged headers (base, then per-call overrides).
    pub headers: HeaderMap,
    /// Body to encode.
    pub body: TransportBody,
}

/// What came back over the wire.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Bytes,
}

/// The pluggable exchange seam.
pub trait Transport: Send + Sync {
    /// Performs one HTTP exchange.
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, ClientError>>;
}

/// The default transport, backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over an existing `reqwest` client, sharing its
    /// pool and defaults.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, ClientError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = client
                .request(request.method, &request.url)
                .headers(request.headers);

            builder = match request.body {
                TransportBody::None => builder,
                TransportBody::Json(value) => builder.json(&value),
                TransportBody::Multipart(parts) => builder.multipart(build_form(parts)?),
            };

            let response = builder.send().await.map_err(ClientError::transport)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(ClientError::transport)?;

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn build_form(parts: Vec<MultipartPart>) -> Result<reqwest::multipart::Form, ClientError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let built = match part.content {
            MultipartContent::Text(value) => reqwest::multipart::Part::text(value),
            MultipartContent::Bytes {
                data,
                file_name,
                content_type,
            } => {
                let mut built = reqwest::multipart::Part::bytes(data.to_vec());
                if let Some(file_name) = file_name {
                    built = built.file_name(file_name);
                }
                if let Some(content_type) = content_type {
                    built = built
                        .mime_str(&content_type)
                        .map_err(ClientError::transport)?;
                }
                built
            }
        };
        form = form.part(part.name, built);
    }
    Ok(form)
}
