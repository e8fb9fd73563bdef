//! Feature aggregation
//!
//! Drives the domain parser, page fetcher and markup analyzer to fill a
//! [`FeatureVector`]. Failures never escape: whatever was computed before
//! the first error is kept and the rest stays at zero.

use thiserror::Error;
use tracing::{debug, error};

use super::domain::DomainParser;
use super::fetcher::{FetchError, PageFetcher};
use super::markup::{self, MarkupAnalyzer, MarkupError};
use crate::config::ScanningConfig;
use crate::types::{flag, FeatureVector};

/// Suffixes treated as established
const COMMON_TLDS: [&str; 5] = ["com", "org", "net", "edu", "gov"];

/// Probability assigned to any suffix outside `COMMON_TLDS`
const UNCOMMON_TLD_PROB: f64 = 0.5;

/// Errors that cut feature extraction short
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Computes feature vectors for URLs
pub struct FeatureExtractor {
    domains: DomainParser,
    fetcher: PageFetcher,
}

impl FeatureExtractor {
    /// Create an extractor from scanning configuration
    pub fn new(config: &ScanningConfig) -> Result<Self, FetchError> {
        Ok(Self {
            domains: DomainParser::new(),
            fetcher: PageFetcher::new(config)?,
        })
    }

    /// Compute the feature vector for `url`. Never fails.
    pub async fn extract(&self, url: &str) -> FeatureVector {
        let mut features = FeatureVector::default();
        if let Err(e) = self.populate(url, &mut features).await {
            error!(url, error = %e, "An error occurred while processing the URL");
        }
        features
    }

    async fn populate(&self, url: &str, features: &mut FeatureVector) -> Result<(), ExtractError> {
        self.fill_url_features(url, features);

        // Everything below depends on the page; a failed fetch leaves it all at zero
        let page = self.fetcher.fetch(url).await?;
        debug!(
            url,
            status = page.status_code,
            redirects = page.redirect_count,
            bytes = page.body.len(),
            "Fetched page in {:?}",
            page.fetch_duration
        );

        features.largest_line_length = markup::largest_line_length(&page.body)? as f64;
        features.robots = flag(self.fetcher.has_robots_txt(url).await);
        features.redirect_count = page.redirect_count as f64;

        // The parsed document is not Send, so no await past this point
        fill_markup_features(&page.body, url, features);
        Ok(())
    }

    /// Features derived from the URL string alone
    fn fill_url_features(&self, url: &str, features: &mut FeatureVector) {
        let parts = self.domains.parse(url);

        features.is_domain_ip = flag(parts.is_ipv4());
        features.ampersand_count = url.matches('&').count() as f64;
        features.tld_legitimate_prob = if COMMON_TLDS.contains(&parts.suffix.as_str()) {
            1.0
        } else {
            UNCOMMON_TLD_PROB
        };
        features.tld_length = parts.suffix.chars().count() as f64;
    }
}

/// Content features from the page markup
fn fill_markup_features(body: &str, origin_url: &str, features: &mut FeatureVector) {
    let markup = MarkupAnalyzer::parse(body);

    features.popup_count = markup.popup_element_count() as f64;
    features.has_external_form_submit = flag(markup.has_external_form_submit(origin_url));
    features.has_hidden_fields = flag(markup.has_hidden_field());
    features.has_password_field = flag(markup.has_password_field());
    features.bank = flag(markup.body_contains_keyword("bank"));
    features.pay = flag(markup.body_contains_keyword("pay"));
    features.crypto = flag(markup.body_contains_keyword("crypto"));
    features.iframe_count = markup.iframe_count() as f64;
    features.empty_ref_count = markup.empty_anchor_count() as f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(&ScanningConfig::default()).unwrap()
    }

    fn url_features(url: &str) -> FeatureVector {
        let mut features = FeatureVector::default();
        extractor().fill_url_features(url, &mut features);
        features
    }

    #[test]
    fn test_common_tld_probability() {
        assert_eq!(url_features("https://example.com").tld_legitimate_prob, 1.0);
        assert_eq!(url_features("https://example.xyz").tld_legitimate_prob, 0.5);
    }

    #[test]
    fn test_tld_length() {
        assert_eq!(url_features("https://example.com").tld_length, 3.0);
        assert_eq!(url_features("https://example.co.uk").tld_length, 5.0);
    }

    #[test]
    fn test_ampersand_count() {
        assert_eq!(url_features("https://a.com/?x=1&y=2").ampersand_count, 1.0);
        assert_eq!(url_features("https://a.com/?x=1&y=2&z=3&&").ampersand_count, 4.0);
        assert_eq!(url_features("https://a.com/").ampersand_count, 0.0);
    }

    #[test]
    fn test_is_domain_ip() {
        assert_eq!(url_features("http://192.168.0.1/path").is_domain_ip, 1.0);
        assert_eq!(url_features("http://example.com").is_domain_ip, 0.0);
    }

    #[test]
    fn test_ip_host_has_no_suffix() {
        let features = url_features("http://10.0.0.1/");
        assert_eq!(features.tld_length, 0.0);
        assert_eq!(features.tld_legitimate_prob, 0.5);
    }

    #[test]
    fn test_markup_features() {
        let html = r##"<html><body>
            <form action="http://other.example/post"><input type="hidden"><input type="password"></form>
            <a href="#">a</a><a href="javascript:void(0);">b</a><a href="javascript:void(0)">c</a>
            <span onclick="window.open('x')">pop</span>
            <iframe></iframe>
            <p>Your bank account needs attention</p>
        </body></html>"##;
        let mut features = FeatureVector::default();
        fill_markup_features(html, "https://site.example", &mut features);

        assert_eq!(features.empty_ref_count, 2.0);
        assert_eq!(features.popup_count, 1.0);
        assert_eq!(features.iframe_count, 1.0);
        assert_eq!(features.has_external_form_submit, 1.0);
        assert_eq!(features.has_hidden_fields, 1.0);
        assert_eq!(features.has_password_field, 1.0);
        assert_eq!(features.bank, 1.0);
        assert_eq!(features.pay, 0.0);
        assert_eq!(features.crypto, 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_page_keeps_url_features() {
        // Port 9 (discard) on localhost is refused immediately
        let features = extractor().extract("http://127.0.0.1:9/?a=1&b=2&c=3").await;

        assert_eq!(features.is_domain_ip, 1.0);
        assert_eq!(features.ampersand_count, 2.0);
        assert_eq!(features.tld_legitimate_prob, 0.5);
        assert_eq!(features.largest_line_length, 0.0);
        assert_eq!(features.robots, 0.0);
        assert_eq!(features.redirect_count, 0.0);
        assert_eq!(features.empty_ref_count, 0.0);
    }

    #[tokio::test]
    async fn test_garbage_input_yields_complete_vector() {
        let features = extractor().extract("definitely not a url").await;
        assert_eq!(features.columns().len(), 16);
        assert_eq!(features.ampersand_count, 0.0);
        assert_eq!(features.largest_line_length, 0.0);
    }
}
