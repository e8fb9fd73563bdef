//! URL and page feature extraction
//!
//! Key components:
//! - `DomainParser`: Public-suffix-aware splitting of URL hosts
//! - `PageFetcher`: Time-bounded page and robots.txt fetching
//! - `MarkupAnalyzer`: Structural queries over fetched HTML
//! - `FeatureExtractor`: Fills a `FeatureVector`, defaulting to zero on failure

pub mod domain;
pub mod features;
pub mod fetcher;
pub mod markup;

pub use domain::{DomainParser, DomainParts};
pub use features::{ExtractError, FeatureExtractor};
pub use fetcher::{FetchError, FetchedPage, PageFetcher};
pub use markup::{MarkupAnalyzer, MarkupError};
