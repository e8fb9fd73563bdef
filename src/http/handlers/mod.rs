//! HTTP API Request Handlers
//!
//! Handlers that map HTTP requests onto feature extraction and dispatch.

mod scan;
mod system;

use std::sync::Arc;

use crate::prediction::PredictionDispatcher;
use crate::scanning::FeatureExtractor;

/// Maximum accepted URL length for automatic scans
const MAX_URL_LENGTH: usize = 8 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<FeatureExtractor>,
    pub dispatcher: Arc<PredictionDispatcher>,
    pub news_timestamp: i64,
}

// Re-export all handlers
pub use scan::{automatic_ai_scan, manual_ai_scan};
pub use system::{news_date, root};
