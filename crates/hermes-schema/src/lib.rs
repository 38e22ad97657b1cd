//! # Hermes Schema
//!
//! Declarative runtime schemas for the Hermes contract toolkit.
//!
//! A [`Schema`] describes the expected shape of a JSON value. Checking a value
//! against a schema either yields the validated (and possibly coerced) value,
//! or a structured [`SchemaError`] listing every failing path.
//!
//! The rest of the workspace treats this crate as an opaque validation
//! capability: the contract tree stores schemas, the server pipeline and the
//! client never inspect them beyond calling [`check`].
//!
//! # Example
//!
//! ```
//! use hermes_schema::{check, CheckOptions, Schema};
//!
//! let schema = Schema::object([
//!     ("id", Schema::string()),
//!     ("count", Schema::integer().coerce()),
//! ]);
//!
//! let value = serde_json::json!({"id": "post-1", "count": "42"});
//! let checked = check(Some(&schema), &value, &CheckOptions::default()).unwrap();
//! assert_eq!(checked["count"], 42);
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod schema;

pub use error::{SchemaError, SchemaIssue};
pub use schema::{check, CheckOptions, Schema};
