//! Contract-bound request router and validation pipeline.
//!
//! The server half of the Hermes toolkit. An implementation tree is bound
//! against a contract tree with [`Router::bind`], producing a [`Router`]
//! whose [`handle`](Router::handle) method runs the full pipeline for one
//! host-neutral [`ServerRequest`]: base-path and preflight policy, body
//! evaluation, middleware, route matching, the four-part schema gate, the
//! handler, response shaping, and CORS decoration. Handlers only ever see
//! requests that passed every declared schema.
//!
//! # Example
//!
//! ```
//! use hermes_core::{Contract, RouteLeaf};
//! use hermes_schema::Schema;
//! use hermes_server::{handler_fn, HandlerResponse, ImplRouter, Router, RouterOptions, ServerRequest};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
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
//!         Ok(HandlerResponse::json(
//!             StatusCode::OK,
//!             json!({"id": request.params["id"]}),
//!         ))
//!     }),
//! );
//!
//! let router = Router::bind(&contract, implementation, RouterOptions::new()).unwrap();
//! let response = router.handle(ServerRequest::get("/posts/7").build()).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cors;
mod handler;
mod options;
mod request;
mod response;
mod router;
mod shape;
mod validate;

pub use cors::{CorsConfig, CorsOrigin};
pub use handler::{
    handler_fn, middleware_fn, BoxFuture, HandlerBody, HandlerResponse, Middleware,
    MiddlewareOutcome, ResponseHeaders, RouteContext, RouteHandler, ValidatedRequest,
};
pub use options::{ErrorHook, RouterOptions};
pub use request::{ServerRequest, ServerRequestBuilder};
pub use response::{ResponseBody, ServerResponse};
pub use router::{ImplNode, ImplRouter, PipelineError, Router};

pub use hermes_core::{
    BindError, HttpError, RequestValidationError, ResponseValidationError, RouteError,
};
