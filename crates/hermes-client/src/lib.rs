//! Contract-driven HTTP client dispatcher.
//!
//! The client half of the Hermes toolkit. A [`Client`] carries the base URL,
//! base headers and a pluggable [`Transport`]; [`Client::bind`] indexes a
//! contract tree so calls dispatch by dotted key path, with the URL, query
//! string and body all derived from the route leaf's declaration.
//!
//! # Example
//!
//! ```no_run
//! use hermes_client::{CallArgs, Client, ClientConfig};
//! use hermes_core::{Contract, RouteLeaf};
//! use hermes_schema::Schema;
//!
//! # async fn run() -> Result<(), hermes_client::ClientError> {
//! let contract = Contract::builder()
//!     .route(
//!         "getPost",
//!         RouteLeaf::get("/posts/:id")
//!             .response(200, Schema::object([("id", Schema::string())]))
//!             .build(),
//!     )
//!     .build();
//!
//! let api = Client::new(ClientConfig::new("https://api.example.com")).bind(&contract);
//! let response = api.call("getPost", CallArgs::new().param("id", "42")).await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod transport;

pub use client::{CallArgs, Client, ClientConfig, ClientResponse, ContractClient};
pub use error::ClientError;
pub use transport::{
    BoxFuture, HttpTransport, MultipartContent, MultipartPart, Transport, TransportBody,
    TransportRequest, TransportResponse,
};
