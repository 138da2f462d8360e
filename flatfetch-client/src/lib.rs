// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Flatfetch Client
//!
//! The rate-limited request pipeline for flatfetch.
//!
//! - [`Session`]: per-client, mutex-guarded usage counters and the
//!   optimistic throttle protocol
//! - [`HttpClient`]: blocking and concurrent request methods that throttle
//!   before every call and record usage from every response
//! - [`HttpClientBuilder`]: configuration surface (rate target, timeout,
//!   user agent, usage header)
//!
//! ## Example
//!
//! ```ignore
//! use flatfetch_client::HttpClient;
//! use flatfetch_core::HttpRequest;
//!
//! let client = HttpClient::with_weight_per_second(10.0)?;
//! let request = HttpRequest::get("https://api.example.com/v1/ticker")
//!     .with_param("symbol", "BTCUSD")
//!     .with_weight(2);
//!
//! let response = client.request_concurrent(&request).await?;
//! let document = response.json()?;
//! ```

pub mod client;
pub mod error;
pub mod session;

// Re-export key types at crate root
pub use client::{HttpClient, HttpClientBuilder};
pub use error::ClientError;
pub use session::{Session, UsageSnapshot};
