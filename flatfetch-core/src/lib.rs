// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Flatfetch Core
//!
//! Request/response models and the declarative extraction protocol for
//! flatfetch.
//!
//! This crate provides the foundational types used across the other
//! flatfetch crates:
//!
//! - [`HttpRequest`] / [`HttpResponse`]: immutable request envelope with a
//!   canonical [`HttpRequest::fingerprint`], and the response it produces
//! - [`path`]: dotted-path navigation into JSON documents
//! - [`JsonSchema`]: ordered field-remapping rules ([`Setter`] / [`Getter`]
//!   pairs) turning raw JSON into flat [`Record`]s
//! - [`CoreError`]: error type shared by models and extraction

pub mod error;
pub mod models;
pub mod path;
pub mod schema;

// Re-export error types
pub use error::CoreError;

// Re-export model types
pub use models::{HttpMethod, HttpRequest, HttpResponse, DEFAULT_WEIGHT};

// Re-export extraction types
pub use schema::{extract, Getter, JsonSchema, Record, Setter};
