//! phishscan: URL phishing classification service
//!
//! Derives a fixed set of lexical and content heuristics from a URL and the
//! page behind it, then asks several externally hosted models for a verdict:
//! - Public-suffix-aware domain parsing
//! - Time-bounded page and robots.txt fetching
//! - HTML structure queries (forms, iframes, popups, empty links)
//! - Concurrent per-model dispatch to BigQuery ML
//! - HS256 bearer-token protected REST API

pub mod auth;
pub mod config;
pub mod http;
pub mod prediction;
pub mod scanning;
pub mod types;

pub use config::Config;
pub use types::*;
