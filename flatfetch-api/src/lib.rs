// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Flatfetch API
//!
//! The endpoint contract and multi-endpoint fan-out layer for flatfetch.
//!
//! - [`Endpoint`]: a request template coupled with a default JSON path and
//!   default extraction schema
//! - [`EndpointCollection`]: an ordered, duplicate-free set of endpoints
//!   with sequential (lazy) and concurrent (joined) extraction, optionally
//!   materializing typed instances
//! - [`ExtractOptions`]: per-call overrides of endpoint defaults
//!
//! ## Example
//!
//! ```ignore
//! use flatfetch_api::{Endpoint, EndpointCollection, ExtractOptions};
//! use flatfetch_client::HttpClient;
//! use flatfetch_core::{HttpRequest, JsonSchema};
//!
//! let client = HttpClient::with_weight_per_second(5.0)?;
//! let collection: EndpointCollection = ["spot", "futures"]
//!     .into_iter()
//!     .map(|market| {
//!         Endpoint::new(HttpRequest::get(format!("https://api.example.com/{market}/ticker")))
//!             .with_json_path("result")
//!             .with_json_schema(JsonSchema::new().field("symbol", "s"))
//!     })
//!     .collect();
//!
//! let records = collection
//!     .extract_concurrent(&client, &ExtractOptions::new())
//!     .await?;
//! ```

pub mod collection;
pub mod endpoint;
pub mod error;
pub mod options;

// Re-export key types at crate root
pub use collection::{EndpointCollection, Extract, ExtractWithSchema};
pub use endpoint::Endpoint;
pub use error::ApiError;
pub use options::{ExtractOptions, Override};
