//! Structured validation failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single validation failure at one location in the checked value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// JSON-path-style location of the failure (e.g. `$.user.tags[0]`).
    pub path: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl SchemaIssue {
    /// Creates an issue at the given path.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The aggregate result of a failed schema check.
///
/// Every failing location is reported; checking never stops at the first
/// issue. The error serializes to a JSON array of `{path, message}` objects
/// so it can be embedded verbatim in wire-level validation responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("schema check failed with {} issue(s)", issues.len())]
pub struct SchemaError {
    /// All failing locations, in document order.
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    /// Creates an error from a list of issues.
    #[must_use]
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    /// Creates an error with a single issue.
    #[must_use]
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![SchemaIssue::new(path, message)],
        }
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if the error carries no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
