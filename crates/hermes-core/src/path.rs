//! Path template engine.
//!
//! Route paths use `:name` segments for parameters (`/posts/:id/comments`).
//! This module extracts parameter names, derives a params schema, substitutes
//! concrete values into a template, and matches concrete paths back against
//! templates.

use hermes_schema::Schema;
use serde_json::{Map, Value};

/// Returns the names of all `:name` segments in `path`, in order.
///
/// # Example
///
/// ```
/// use hermes_core::path::param_names;
///
/// let names = param_names("/posts/:id/comments/:commentId");
/// assert_eq!(names, vec!["id", "commentId"]);
/// ```
#[must_use]
pub fn param_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(ToString::to_string)
        .collect()
}

/// Derives the path-params schema for `path`.
///
/// Returns `None` when the path has no parameter segments. The distinction
/// matters: `None` means "this route takes no params at all", which is not
/// the same as an empty object schema that would require `{}`.
#[must_use]
pub fn params_schema(path: &str) -> Option<Schema> {
    let names = param_names(path);
    if names.is_empty() {
        return None;
    }

    Some(Schema::object(
        names.iter().map(|name| (name.as_str(), Schema::string())),
    ))
}

/// Substitutes `params` into `path`, producing a concrete path.
///
/// Each `:name` segment is replaced with the corresponding param rendered as
/// a string; a missing param becomes the empty string. Any doubled slash
/// produced by an empty substitution is collapsed. The substitution is
/// deliberately non-validating: a malformed path from a missing param is
/// legal and propagates to the transport.
///
/// # Example
///
/// ```
/// use hermes_core::path::insert_params;
/// use serde_json::Map;
///
/// let mut params = Map::new();
/// params.insert("id".into(), "123".into());
/// assert_eq!(insert_params("/posts/:id/thumbnail", &params), "/posts/123/thumbnail");
/// assert_eq!(insert_params("/posts/:id", &Map::new()), "/posts/");
/// ```
#[must_use]
pub fn insert_params(path: &str, params: &Map<String, Value>) -> String {
    let substituted = path
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => params.get(name).map(render_param).unwrap_or_default(),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut collapsed = substituted;
    while collapsed.contains("//") {
        collapsed = collapsed.replace("//", "/");
    }
    collapsed
}

fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reduces `path` to its template shape for documentation purposes.
///
/// Every `:name` segment becomes a `*` wildcard, and consecutive wildcard
/// segments collapse into a single run, so `/a/:b/:c/d` and `/a/:x/d`
/// produce the same shape.
///
/// # Example
///
/// ```
/// use hermes_core::path::template;
///
/// assert_eq!(template("/posts/:id/comments/:commentId"), "/posts/*/comments/*");
/// assert_eq!(template("/posts/:a/:b"), "/posts/*");
/// ```
#[must_use]
pub fn template(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        let rendered = if segment.starts_with(':') { "*" } else { segment };
        if rendered == "*" && segments.last() == Some(&"*") {
            continue;
        }
        segments.push(rendered);
    }
    segments.join("/")
}

/// Matches a concrete `request_path` against a `pattern` with `:name`
/// segments, extracting the parameter values.
///
/// Returns `None` when the path does not match. Empty segments on either
/// side are ignored, so trailing slashes are tolerated.
#[must_use]
pub fn match_path(pattern: &str, request_path: &str) -> Option<Map<String, Value>> {
    let request_path = request_path.split('?').next().unwrap_or(request_path);

    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let request_segments: Vec<&str> = request_path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_segments.len() != request_segments.len() {
        return None;
    }

    let mut params = Map::new();
    for (pattern_segment, actual) in pattern_segments.iter().zip(&request_segments) {
        match pattern_segment.strip_prefix(':') {
            Some(name) => {
                params.insert(name.to_string(), Value::String((*actual).to_string()));
            }
            None => {
                if pattern_segment != actual {
                    return None;
                }
            }
        }
    }

    Some(params)
}
