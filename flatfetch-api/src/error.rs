//! API layer error types.

use thiserror::Error;

/// Error type for endpoint and fan-out operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request pipeline error.
    #[error("Client error: {0}")]
    Client(#[from] flatfetch_client::ClientError),

    /// Model or extraction error.
    #[error("Core error: {0}")]
    Core(#[from] flatfetch_core::CoreError),

    /// A flat record could not be materialized into the requested type.
    #[error("Failed to construct {type_name} from record: {source}")]
    Instance {
        /// Target type name.
        type_name: &'static str,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}
