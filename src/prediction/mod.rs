//! Phishing classification through externally hosted models
//!
//! Supports pluggable backends:
//! - BigQuery ML (`ML.PREDICT` through the REST API)
//! - Anything implementing `ModelBackend` (fakes in tests)

pub mod bigquery;
pub mod dispatcher;
pub mod traits;

pub use bigquery::BigQueryBackend;
pub use dispatcher::{DispatchError, PredictionDispatcher, PredictionResults};
pub use traits::{ModelBackend, PredictError, PredictResult};

use std::sync::Arc;

use crate::config::PredictionConfig;

/// Build the dispatcher described by `config`, backed by BigQuery ML
pub fn create_dispatcher(config: &PredictionConfig) -> PredictResult<PredictionDispatcher> {
    let backend: Arc<dyn ModelBackend> = Arc::new(BigQueryBackend::new(config)?);
    Ok(PredictionDispatcher::new(
        backend,
        config.models.clone(),
        config.max_concurrent_models,
    ))
}
