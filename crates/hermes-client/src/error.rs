//! Client-side failures.

use thiserror::Error;

use hermes_schema::SchemaError;

/// Everything that can go wrong on a client call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not complete the exchange (connect failure,
    /// timeout, TLS, malformed multipart).
    #[error("transport failure: {0}")]
    Transport(#[source] anyhow::Error),

    /// The dotted key path does not name a route leaf in the contract.
    #[error("unknown route `{key_path}`")]
    UnknownRoute {
        /// The key path that was looked up.
        key_path: String,
    },

    /// The response body could not be parsed as JSON.
    #[error("response body is not valid JSON")]
    Decode(#[from] serde_json::Error),

    /// The response failed the schema the contract declares for its status.
    #[error("response for {method} {path} (status {status}) failed its declared schema")]
    ResponseValidation {
        /// Method of the route.
        method: String,
        /// Path template of the route.
        path: String,
        /// Status the server returned.
        status: u16,
        /// The underlying schema failure.
        cause: SchemaError,
    },
}

impl ClientError {
    /// Wraps a transport-level failure.
    #[must_use]
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        Self::Transport(err.into())
    }
}
