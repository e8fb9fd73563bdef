//! Model backend trait definitions
//!
//! Defines the seam between the dispatcher and whatever hosts the models.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::types::FeatureVector;

/// Errors that can occur while scoring one model
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message reported by the API
        message: String,
    },

    /// The query did not finish within its timeout
    #[error("Query did not complete in time")]
    Incomplete,

    /// The response could not be interpreted
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Result type for prediction operations
pub type PredictResult<T> = Result<T, PredictError>;

/// Core trait for model backends
///
/// The trait is object-safe for use as `Arc<dyn ModelBackend>`.
#[async_trait]
pub trait ModelBackend: Send + Sync + Debug {
    /// Score `features` with the model identified by `model_id` and return
    /// its predicted label as typed JSON (number, boolean or string)
    async fn predict(&self, model_id: &str, features: &FeatureVector) -> PredictResult<Value>;

    /// Get the backend name (e.g., "bigquery")
    fn name(&self) -> &str;
}
