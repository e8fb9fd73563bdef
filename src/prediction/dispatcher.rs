//! Multi-model prediction dispatch
//!
//! Sends one feature vector to every configured model. Models are scored
//! concurrently up to a fixed budget and fail independently: a model whose
//! query errors is reported as "Prediction failed" while the rest still
//! return their labels.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use super::traits::ModelBackend;
use crate::types::{FeatureVector, PREDICTION_FAILED};

/// Failures that abort a whole dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no prediction models are configured")]
    NoModels,
    #[error("feature {0} is not a finite number")]
    NonFiniteFeature(&'static str),
}

/// Model name to predicted label (or "Prediction failed").
///
/// Labels keep the JSON type the backend reported, so an integer class
/// stays a number on the wire.
pub type PredictionResults = BTreeMap<String, Value>;

/// Fans a feature vector out to every configured model
#[derive(Debug)]
pub struct PredictionDispatcher {
    backend: Arc<dyn ModelBackend>,
    /// Model name to backend model identifier
    models: BTreeMap<String, String>,
    max_concurrent: usize,
}

impl PredictionDispatcher {
    /// Create a dispatcher over `models` using `backend`
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        models: BTreeMap<String, String>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            backend,
            models,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Names of the configured models
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Score `features` with every model.
    ///
    /// Only fails before any model is contacted; per-model errors are
    /// folded into the result map.
    pub async fn dispatch(&self, features: &FeatureVector) -> Result<PredictionResults, DispatchError> {
        if let Some(name) = features.first_non_finite() {
            return Err(DispatchError::NonFiniteFeature(name));
        }
        if self.models.is_empty() {
            return Err(DispatchError::NoModels);
        }

        // Owned pairs keep the per-model futures free of borrows into the
        // table, which axum handlers require of everything they await
        let results = stream::iter(self.models.clone())
            .map(|(model_name, model_id)| async move {
                info!(
                    "Processing model: {} with {} identifier: {}",
                    model_name,
                    self.backend.name(),
                    model_id
                );
                let label = match self.backend.predict(&model_id, features).await {
                    Ok(label) => label,
                    Err(e) => {
                        error!(model = %model_name, error = %e, "Error processing model");
                        Value::from(PREDICTION_FAILED)
                    }
                };
                (model_name, label)
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<PredictionResults>()
            .await;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::traits::{PredictError, PredictResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend answering from a fixed table and failing on unknown models
    #[derive(Debug, Default)]
    struct TableBackend {
        labels: BTreeMap<String, Value>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelBackend for TableBackend {
        async fn predict(&self, model_id: &str, _features: &FeatureVector) -> PredictResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.labels.get(model_id).cloned().ok_or(PredictError::Api {
                status: 404,
                message: format!("Not found: Model {}", model_id),
            })
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    fn models() -> BTreeMap<String, String> {
        [
            ("decision_tree_model", "ds.decision_tree_model"),
            ("logistic_regression_model", "ds.logistic_regression_model"),
            ("xgboost_model", "ds.xgboost_model"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn backend_without(missing: &str) -> Arc<TableBackend> {
        let labels = models()
            .into_values()
            .filter(|id| id != missing)
            .map(|id| (id, Value::from(1)))
            .collect();
        Arc::new(TableBackend {
            labels,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_failing_model_does_not_affect_others() {
        let backend = backend_without("ds.logistic_regression_model");
        let dispatcher = PredictionDispatcher::new(backend.clone(), models(), 2);

        let results = dispatcher.dispatch(&FeatureVector::default()).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results["decision_tree_model"], 1);
        assert_eq!(results["xgboost_model"], 1);
        assert_eq!(results["logistic_regression_model"], PREDICTION_FAILED);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sequential_budget_gives_same_results() {
        let dispatcher = PredictionDispatcher::new(backend_without("none"), models(), 1);
        let results = dispatcher.dispatch(&FeatureVector::default()).await.unwrap();
        assert!(results.values().all(|label| *label == 1));
    }

    #[tokio::test]
    async fn test_no_models_is_a_service_failure() {
        let dispatcher = PredictionDispatcher::new(backend_without("none"), BTreeMap::new(), 4);
        let err = dispatcher.dispatch(&FeatureVector::default()).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoModels));
    }

    #[tokio::test]
    async fn test_non_finite_features_are_rejected_before_dispatch() {
        let backend = backend_without("none");
        let dispatcher = PredictionDispatcher::new(backend.clone(), models(), 4);
        let features = FeatureVector {
            largest_line_length: f64::NAN,
            ..Default::default()
        };

        let err = dispatcher.dispatch(&features).await.unwrap_err();
        assert!(matches!(err, DispatchError::NonFiniteFeature("LargestLineLength")));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
