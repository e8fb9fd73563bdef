//! Core types for phishscan

use serde::{Deserialize, Serialize};

/// Predicted label reported when a model returns no rows or no `predicted_label` column
pub const NO_PREDICTION: &str = "No prediction available";

/// Label reported for a model whose query failed
pub const PREDICTION_FAILED: &str = "Prediction failed";

/// Column names of the feature vector, in the order the models were trained on
pub const FEATURE_COLUMNS: [&str; 16] = [
    "IsDomainIP",
    "NoOfAmpersandInURL",
    "TLDLegitimateProb",
    "TLDLength",
    "LargestLineLength",
    "Robots",
    "NoOfURLRedirect",
    "NoOfPopup",
    "HasExternalFormSubmit",
    "HasHiddenFields",
    "HasPasswordField",
    "Bank",
    "Pay",
    "Crypto",
    "NoOfiFrame",
    "NoOfEmptyRef",
];

// ============================================================================
// Feature Vector
// ============================================================================

/// Fixed 16-field numeric description of a URL and the page behind it.
///
/// Every field is always present. Fields that could not be computed keep
/// their `0.0` default, so a zero is indistinguishable from a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "IsDomainIP")]
    pub is_domain_ip: f64,
    #[serde(rename = "NoOfAmpersandInURL")]
    pub ampersand_count: f64,
    #[serde(rename = "TLDLegitimateProb")]
    pub tld_legitimate_prob: f64,
    #[serde(rename = "TLDLength")]
    pub tld_length: f64,
    #[serde(rename = "LargestLineLength")]
    pub largest_line_length: f64,
    #[serde(rename = "Robots")]
    pub robots: f64,
    #[serde(rename = "NoOfURLRedirect")]
    pub redirect_count: f64,
    #[serde(rename = "NoOfPopup")]
    pub popup_count: f64,
    #[serde(rename = "HasExternalFormSubmit")]
    pub has_external_form_submit: f64,
    #[serde(rename = "HasHiddenFields")]
    pub has_hidden_fields: f64,
    #[serde(rename = "HasPasswordField")]
    pub has_password_field: f64,
    #[serde(rename = "Bank")]
    pub bank: f64,
    #[serde(rename = "Pay")]
    pub pay: f64,
    #[serde(rename = "Crypto")]
    pub crypto: f64,
    #[serde(rename = "NoOfiFrame")]
    pub iframe_count: f64,
    #[serde(rename = "NoOfEmptyRef")]
    pub empty_ref_count: f64,
}

impl FeatureVector {
    /// All features paired with their column names, in `FEATURE_COLUMNS` order
    pub fn columns(&self) -> [(&'static str, f64); 16] {
        let values = [
            self.is_domain_ip,
            self.ampersand_count,
            self.tld_legitimate_prob,
            self.tld_length,
            self.largest_line_length,
            self.robots,
            self.redirect_count,
            self.popup_count,
            self.has_external_form_submit,
            self.has_hidden_fields,
            self.has_password_field,
            self.bank,
            self.pay,
            self.crypto,
            self.iframe_count,
            self.empty_ref_count,
        ];
        let mut out = [("", 0.0); 16];
        for (slot, (name, value)) in out.iter_mut().zip(FEATURE_COLUMNS.iter().zip(values)) {
            *slot = (*name, value);
        }
        out
    }

    /// Name of the first feature that is NaN or infinite, if any
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.columns()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

/// Map a boolean heuristic onto the 0.0 / 1.0 encoding the models expect
pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
