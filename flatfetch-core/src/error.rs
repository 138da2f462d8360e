//! Core error types for flatfetch.

use thiserror::Error;

/// Core error type for model and extraction operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A tuple setter and its getter result disagree on length.
    ///
    /// This is a definitional error in the schema, not a runtime recovery
    /// case: the value is neither truncated nor padded.
    #[error("Schema shape mismatch: setter expects {expected} values, getter produced {actual}")]
    ShapeMismatch {
        /// Number of output paths in the setter tuple.
        expected: usize,
        /// Number of elements in the getter result.
        actual: usize,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
