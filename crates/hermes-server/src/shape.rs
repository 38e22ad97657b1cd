//! Response shaping.
//!
//! Reconciles what a handler returned against what the route declared for
//! that status code. Shaping by declared kind is unconditional; only the
//! schema checks are optional. With validation enabled, declared JSON bodies
//! are checked before anything is emitted; an invalid body is a server-side
//! defect and never reaches the wire.

use http::StatusCode;
use serde_json::Value;

use hermes_core::{ResponseKind, ResponseValidationError, RouteLeaf};
use hermes_schema::{check, CheckOptions, SchemaError};

use crate::handler::{HandlerBody, HandlerResponse};
use crate::response::ServerResponse;

pub(crate) fn shape_response(
    leaf: &RouteLeaf,
    response: HandlerResponse,
    validate: bool,
) -> Result<ServerResponse, ResponseValidationError> {
    let status = response.status;
    match leaf.response(status.as_u16()) {
        Some(ResponseKind::Body(schema)) => match response.body {
            HandlerBody::Json(value) => {
                let checked = if validate {
                    check(Some(schema), &value, &CheckOptions::default())
                        .map_err(|cause| defect(leaf, status, cause))?
                } else {
                    value
                };
                Ok(ServerResponse::json(status, checked))
            }
            HandlerBody::Blob { .. } if validate => Err(defect(
                leaf,
                status,
                SchemaError::single("$", "expected a JSON body"),
            )),
            HandlerBody::Blob {
                bytes,
                content_type,
            } => Ok(ServerResponse::binary(
                status,
                content_type.as_deref().unwrap_or("application/octet-stream"),
                bytes,
            )),
        },
        // A declared no-body status drops any payload the handler produced.
        Some(ResponseKind::NoBody) => Ok(ServerResponse::new(status)),
        Some(ResponseKind::Other {
            content_type,
            schema,
        }) => match response.body {
            HandlerBody::Blob {
                bytes,
                content_type: override_type,
            } => {
                let emitted = override_type.as_deref().unwrap_or(content_type);
                Ok(ServerResponse::binary(status, emitted, bytes))
            }
            HandlerBody::Json(value) => {
                let checked = if validate {
                    check(schema.as_ref(), &value, &CheckOptions::default())
                        .map_err(|cause| defect(leaf, status, cause))?
                } else {
                    value
                };
                Ok(ServerResponse::text(status, content_type, render(checked)))
            }
        },
        None if validate && leaf.strict_status_codes() => Err(defect(
            leaf,
            status,
            SchemaError::single("$", "undeclared status code"),
        )),
        // Undeclared statuses pass through untyped.
        None => match response.body {
            HandlerBody::Json(value) => Ok(ServerResponse::json(status, value)),
            HandlerBody::Blob {
                bytes,
                content_type,
            } => Ok(ServerResponse::binary(
                status,
                content_type.as_deref().unwrap_or("application/octet-stream"),
                bytes,
            )),
        },
    }
}

fn defect(leaf: &RouteLeaf, status: StatusCode, cause: SchemaError) -> ResponseValidationError {
    ResponseValidationError {
        method: leaf.method().to_string(),
        path: leaf.path().to_string(),
        status: status.as_u16(),
        cause,
    }
}

fn render(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
