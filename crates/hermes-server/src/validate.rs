//! The four-part request schema gate.
//!
//! Every part is checked independently and all failures are aggregated, so a
//! 400 response reports params, headers, query and body problems at once.
//! Params and headers are checked in pass-through mode (a request always
//! carries headers the contract never mentions); query and body use the
//! stripping default.

use http::HeaderMap;
use serde_json::{Map, Value};

use hermes_core::query::parse_json_query;
use hermes_core::{RequestValidationError, RouteLeaf};
use hermes_schema::{check, CheckOptions};

use crate::handler::ValidatedRequest;
use crate::request::ServerRequest;

/// Checks a matched request against the route's declared schemas.
///
/// With `json_query` enabled, raw query strings are leniently parsed as JSON
/// before the schema check, so `skip=0` reaches an integer schema as the
/// number `0`.
pub(crate) fn validate_request(
    request: &ServerRequest,
    leaf: &RouteLeaf,
    json_query: bool,
) -> Result<ValidatedRequest, RequestValidationError> {
    let passthrough = CheckOptions::passthrough();
    let strip = CheckOptions::default();

    let params_value = Value::Object(request.params().clone());
    let params = check(leaf.path_params(), &params_value, &passthrough);

    let headers_value = Value::Object(headers_to_map(request.headers()));
    let headers = check(leaf.headers(), &headers_value, &passthrough);

    let query_value = if json_query {
        Value::Object(parse_json_query(request.query()))
    } else {
        Value::Object(request.query().clone())
    };
    let query = check(leaf.query(), &query_value, &strip);

    let body_value = request.content().cloned().unwrap_or(Value::Null);
    let body = check(leaf.body(), &body_value, &strip);

    match (params, headers, query, body) {
        (Ok(params), Ok(headers), Ok(query), Ok(body)) => Ok(ValidatedRequest {
            params,
            query,
            body,
            headers,
        }),
        (params, headers, query, body) => Err(RequestValidationError {
            params: params.err(),
            headers: headers.err(),
            query: query.err(),
            body: body.err(),
        }),
    }
}

fn headers_to_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    map
}
