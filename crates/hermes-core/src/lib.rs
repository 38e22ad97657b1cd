//! # Hermes Core
//!
//! The declarative heart of the Hermes contract toolkit.
//!
//! This crate provides the types shared by the server and client bindings:
//!
//! - [`Contract`] / [`RouteLeaf`] - the immutable contract tree describing an
//!   HTTP surface (methods, paths, schemas, response shapes)
//! - [`path`] - the path template engine (`/posts/:id` parsing, substitution
//!   and matching)
//! - [`query`] - the canonical query-string codec shared by client and server
//! - [`HttpError`] and friends - the error taxonomy every binding maps into
//!
//! A contract is pure data: once built it is never mutated, and both the
//! server router and the client dispatcher walk the same tree.

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contract;
mod error;
pub mod path;
pub mod query;

pub use contract::{Contract, ContractBuilder, ContractNode, ResponseKind, RouteLeaf};
pub use error::{
    BindError, HttpError, RequestValidationError, ResponseValidationError, RouteError,
};
