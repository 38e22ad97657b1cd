//! Canonical query-string codec.
//!
//! The client serializes query objects with [`encode_query`]; a server with
//! JSON-query mode enabled decodes raw values with [`parse_json_query`].
//! Together they round-trip scalar values with their types intact: a query
//! object `{skip: 0}` encodes to `skip=0` and decodes back to the number `0`.
//!
//! The encoding is the one canonical form for the toolkit: array elements are
//! flattened to repeated `key[]` pairs, nested object members to bracketed
//! `key[member]` pairs, string scalars are rendered raw, and all other
//! scalars are rendered as JSON. Empty arrays and objects contribute nothing.

use serde_json::{Map, Value};

/// Serializes a query object to a URL query component.
///
/// Returns the empty string when nothing encodes, otherwise a string starting
/// with `?`, ready to append to a path.
///
/// # Example
///
/// ```
/// use hermes_core::query::encode_query;
///
/// let query = serde_json::json!({"skip": 0, "tags": ["a", "b"]});
/// assert_eq!(encode_query(&query), "?skip=0&tags%5B%5D=a&tags%5B%5D=b");
/// ```
#[must_use]
pub fn encode_query(query: &Value) -> String {
    let Some(object) = query.as_object() else {
        return String::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in object {
        encode_pair(key, value, &mut pairs);
    }

    if pairs.is_empty() {
        return String::new();
    }

    let encoded = pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("?{encoded}")
}

fn encode_pair(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Array(elements) => {
            for element in elements {
                encode_pair(&format!("{key}[]"), element, pairs);
            }
        }
        Value::Object(members) => {
            for (member, inner) in members {
                encode_pair(&format!("{key}[{member}]"), inner, pairs);
            }
        }
        Value::String(s) => pairs.push((key.to_string(), s.clone())),
        scalar => pairs.push((key.to_string(), scalar.to_string())),
    }
}

/// Parses a raw query string into the map shape the server pipeline expects.
///
/// This is the inverse of [`encode_query`] for the canonical encoding:
/// repeated `key[]` pairs rebuild arrays, bracketed `key[member]` pairs
/// rebuild nested objects, and every scalar value stays a raw string (the
/// schema check, or JSON-query mode, is responsible for typing). A repeated
/// plain key also collects into an array, for clients that never bracket.
///
/// # Example
///
/// ```
/// use hermes_core::query::decode_query;
///
/// let decoded = decode_query("tags%5B%5D=a&tags%5B%5D=b&skip=0");
/// assert_eq!(decoded["tags"], serde_json::json!(["a", "b"]));
/// assert_eq!(decoded["skip"], serde_json::json!("0"));
/// ```
#[must_use]
pub fn decode_query(query_string: &str) -> Map<String, Value> {
    let mut decoded = Map::new();

    let trimmed = query_string.trim_start_matches('?');
    if trimmed.is_empty() {
        return decoded;
    }

    for pair in trimmed.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(raw_key);
        let value = Value::String(percent_decode(raw_value));

        let (base, segments) = split_bracketed_key(&key);
        insert_at_path(&mut decoded, base, &segments, value);
    }

    decoded
}

fn percent_decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned())
}

enum KeySegment {
    Member(String),
    Push,
}

fn split_bracketed_key(key: &str) -> (&str, Vec<KeySegment>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };

    let (base, mut rest) = key.split_at(open);
    let mut segments = Vec::new();
    while let Some(close) = rest.find(']') {
        let inner = &rest[1..close];
        segments.push(if inner.is_empty() {
            KeySegment::Push
        } else {
            KeySegment::Member(inner.to_string())
        });
        rest = &rest[close + 1..];
        if !rest.starts_with('[') {
            break;
        }
    }

    (base, segments)
}

fn insert_at_path(target: &mut Map<String, Value>, base: &str, segments: &[KeySegment], value: Value) {
    match segments.split_first() {
        None => match target.get_mut(base) {
            // A repeated plain key collects into an array.
            Some(Value::Array(existing)) => existing.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                target.insert(base.to_string(), value);
            }
        },
        Some((KeySegment::Push, _)) => {
            let slot = target
                .entry(base.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(elements) = slot {
                elements.push(value);
            }
        }
        Some((KeySegment::Member(member), rest)) => {
            let slot = target
                .entry(base.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(members) = slot {
                insert_at_path(members, member, rest, value);
            }
        }
    }
}

/// Decodes raw query values for JSON-query mode.
///
/// Every string value is parsed as JSON; values that fail to parse are passed
/// through as raw strings. This is deliberately lenient: type mismatches are
/// the schema check's job, not the decoder's. Arrays of raw values are
/// decoded element-wise.
#[must_use]
pub fn parse_json_query(query: &Map<String, Value>) -> Map<String, Value> {
    query
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

fn decode_value(value: &Value) -> Value {
    match value {
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| value.clone()),
        Value::Array(elements) => Value::Array(elements.iter().map(decode_value).collect()),
        other => other.clone(),
    }
}
