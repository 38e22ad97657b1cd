//! # Hermes
//!
//! **Contract-driven HTTP routing, validation and client dispatch**
//!
//! Hermes centers everything on one declarative contract tree:
//!
//! - **One source of truth** - the same [`Contract`](hermes_core::Contract)
//!   drives the server's route table and the client's dispatch
//! - **Schema gate** - handlers only ever see requests that passed every
//!   declared params, headers, query and body schema
//! - **Shape-checked binding** - an implementation tree that does not mirror
//!   the contract fails at startup, not per request
//! - **Host-neutral** - the router consumes and produces plain request and
//!   response values; any listener can adapt to it
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let contract = Contract::builder()
//!     .route(
//!         "getPost",
//!         RouteLeaf::get("/posts/:id")
//!             .response(200, Schema::object([("id", Schema::string())]))
//!             .build(),
//!     )
//!     .build();
//!
//! let implementation = ImplRouter::new().handler(
//!     "getPost",
//!     handler_fn(|request, _ctx| async move {
//!         Ok(HandlerResponse::json(StatusCode::OK, json!({"id": request.params["id"]})))
//!     }),
//! );
//!
//! let router = Router::bind(&contract, implementation, RouterOptions::new())?;
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export schema types
pub use hermes_schema as schema;

// Re-export contract and shared types
pub use hermes_core as core;

// Re-export server types
pub use hermes_server as server;

// Re-export client types
pub use hermes_client as client;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use hermes_schema::{check, CheckOptions, Schema, SchemaError, SchemaIssue};

    // Re-export the contract tree and error taxonomy
    pub use hermes_core::{
        BindError, Contract, ContractNode, HttpError, RequestValidationError,
        ResponseValidationError, ResponseKind, RouteError, RouteLeaf,
    };

    // Re-export the server pipeline
    pub use hermes_server::{
        handler_fn, middleware_fn, CorsConfig, CorsOrigin, HandlerBody, HandlerResponse,
        ImplRouter, Middleware, MiddlewareOutcome, PipelineError, ResponseBody, ResponseHeaders,
        RouteContext, RouteHandler, Router, RouterOptions, ServerRequest, ServerResponse,
        ValidatedRequest,
    };

    // Re-export the client dispatcher
    pub use hermes_client::{
        CallArgs, Client, ClientConfig, ClientError, ClientResponse, ContractClient,
        HttpTransport, MultipartPart, Transport,
    };
}
