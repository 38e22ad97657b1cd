//! The host-neutral outbound response.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use hermes_core::HttpError;

/// The response payload, tagged by how the host should serialize it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseBody {
    /// No payload.
    #[default]
    None,
    /// A JSON document; the host serializes it.
    Json(Value),
    /// An already-rendered text payload.
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
}

/// An outbound HTTP response in the shape the pipeline produces.
///
/// The host adapter converts this back into its native response type. The
/// content-type header is already set wherever the payload demands one.
#[derive(Debug, Clone)]
pub struct ServerResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl ServerResponse {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::None,
        }
    }

    /// Creates a JSON response with the given status.
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        let mut response = Self::new(status);
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response.body = ResponseBody::Json(body);
        response
    }

    /// Creates a text response with the given status and content type.
    #[must_use]
    pub fn text(status: StatusCode, content_type: &str, body: impl Into<String>) -> Self {
        let mut response = Self::new(status);
        response.set_content_type(content_type);
        response.body = ResponseBody::Text(body.into());
        response
    }

    /// Creates a binary response with the given status and content type.
    #[must_use]
    pub fn binary(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut response = Self::new(status);
        response.set_content_type(content_type);
        response.body = ResponseBody::Binary(body.into());
        response
    }

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

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the payload.
    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Sets a header, replacing any prior value. Invalid values are dropped.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    /// Appends a value to a header, preserving prior values.
    pub fn append_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
    }

    fn set_content_type(&mut self, content_type: &str) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(header::CONTENT_TYPE, value);
        }
    }
}

impl From<HttpError> for ServerResponse {
    fn from(error: HttpError) -> Self {
        if error.is_json() {
            let mut response = Self::json(error.status, error.body);
            response.set_content_type(&error.content_type);
            response
        } else {
            let rendered = match error.body {
                Value::String(s) => s,
                other => other.to_string(),
            };
            Self::text(error.status, &error.content_type, rendered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_sets_content_type() {
        let response = ServerResponse::json(StatusCode::OK, json!({"ok": true}));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.body(), &ResponseBody::Json(json!({"ok": true})));
    }

    #[test]
    fn test_from_http_error_json() {
        let response: ServerResponse = HttpError::not_found().into();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.body(),
            &ResponseBody::Json(json!({"message": "Not Found"}))
        );
    }

    #[test]
    fn test_from_http_error_text() {
        let error = HttpError::new(StatusCode::OK, json!("pong")).with_content_type("text/plain");
        let response: ServerResponse = error.into();
        assert_eq!(response.body(), &ResponseBody::Text("pong".to_string()));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn test_append_header_preserves_values() {
        let mut response = ServerResponse::new(StatusCode::OK);
        response.append_header(header::VARY, "Origin");
        response.append_header(header::VARY, "Accept");
        assert_eq!(response.headers().get_all(header::VARY).iter().count(), 2);
    }
}
