//! BigQuery ML model backend
//!
//! Scores a feature vector with `ML.PREDICT` through the BigQuery REST
//! `jobs.query` endpoint. Feature values travel as named FLOAT64 query
//! parameters; only the model identifier, which comes from configuration
//! and is validated at load time, is part of the query text.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::{ModelBackend, PredictError, PredictResult};
use crate::config::{is_valid_model_id, PredictionConfig};
use crate::types::{FeatureVector, FEATURE_COLUMNS, NO_PREDICTION};

/// Column holding the label in `ML.PREDICT` output
const LABEL_COLUMN: &str = "predicted_label";

/// Slack added on top of the server-side query timeout for the HTTP client
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// BigQuery ML backend
#[derive(Debug)]
pub struct BigQueryBackend {
    client: reqwest::Client,
    queries_url: String,
    timeout: Duration,
}

/// `jobs.query` request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: String,
    use_legacy_sql: bool,
    parameter_mode: &'a str,
    timeout_ms: u64,
    query_parameters: Vec<QueryParameter<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryParameter<'a> {
    name: &'a str,
    parameter_type: ParameterType<'a>,
    parameter_value: ParameterValue,
}

#[derive(Debug, Serialize)]
struct ParameterType<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct ParameterValue {
    value: String,
}

/// `jobs.query` response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
    /// Legacy or standard SQL type name ("INTEGER", "INT64", "FLOAT64", ...)
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

/// Google API error response format
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl BigQueryBackend {
    /// Create a new BigQuery backend
    pub fn new(config: &PredictionConfig) -> PredictResult<Self> {
        info!(
            "Initializing BigQuery backend: endpoint={}, project={}",
            config.endpoint, config.project_id
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match config.resolve_access_token() {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                    PredictError::Malformed(format!("Invalid access token format: {}", e))
                })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => warn!("No access token configured for {}", config.endpoint),
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout + CLIENT_TIMEOUT_SLACK)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            queries_url: format!(
                "{}/projects/{}/queries",
                config.endpoint.trim_end_matches('/'),
                config.project_id
            ),
            timeout,
        })
    }

    fn build_request(&self, model_id: &str, features: &FeatureVector) -> QueryRequest<'static> {
        let query_parameters = features
            .columns()
            .into_iter()
            .map(|(name, value)| QueryParameter {
                name,
                parameter_type: ParameterType { kind: "FLOAT64" },
                parameter_value: ParameterValue {
                    value: value.to_string(),
                },
            })
            .collect();

        QueryRequest {
            query: predict_query(model_id),
            use_legacy_sql: false,
            parameter_mode: "NAMED",
            timeout_ms: self.timeout.as_millis() as u64,
            query_parameters,
        }
    }
}

#[async_trait]
impl ModelBackend for BigQueryBackend {
    async fn predict(&self, model_id: &str, features: &FeatureVector) -> PredictResult<Value> {
        if !is_valid_model_id(model_id) {
            return Err(PredictError::Malformed(format!(
                "refusing model identifier '{}'",
                model_id
            )));
        }

        let request = self.build_request(model_id, features);
        debug!("Sending ML.PREDICT query for {} to {}", model_id, self.queries_url);

        let response = self.client.post(&self.queries_url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(PredictError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| PredictError::Malformed(format!("Failed to parse response: {}", e)))?;

        extract_label(body)
    }

    fn name(&self) -> &str {
        "bigquery"
    }
}

/// `ML.PREDICT` over a single row built from the named parameters
fn predict_query(model_id: &str) -> String {
    let projection = FEATURE_COLUMNS
        .iter()
        .map(|name| format!("@{name} AS {name}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT * FROM ML.PREDICT(MODEL `{}`, (SELECT {}))",
        model_id, projection
    )
}

/// Pull the label out of the last returned row, typed by its schema column
fn extract_label(response: QueryResponse) -> PredictResult<Value> {
    if !response.job_complete {
        return Err(PredictError::Incomplete);
    }

    let Some(row) = response.rows.last() else {
        return Ok(Value::from(NO_PREDICTION));
    };

    let column = response.schema.as_ref().and_then(|s| {
        s.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == LABEL_COLUMN)
    });

    let Some((index, field)) = column else {
        return Ok(Value::from(NO_PREDICTION));
    };

    let cell = row
        .f
        .get(index)
        .ok_or_else(|| PredictError::Malformed("row is shorter than schema".to_string()))?;

    Ok(typed_cell(&field.kind, &cell.v))
}

/// The REST API returns every scalar as a string; restore the column type.
/// Values that do not parse as their declared type pass through unchanged.
fn typed_cell(kind: &str, raw: &Value) -> Value {
    let Value::String(text) = raw else {
        return raw.clone();
    };

    let typed = match kind.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => text.parse::<i64>().ok().map(Value::from),
        "FLOAT" | "FLOAT64" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "NUMERIC" | "BIGNUMERIC" => text.parse::<i64>().ok().map(Value::from).or_else(|| {
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }),
        "BOOLEAN" | "BOOL" => match text.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };

    typed.unwrap_or_else(|| raw.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> QueryResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_query_binds_every_feature_as_parameter() {
        let query = predict_query("proj.ds.model");
        assert!(query.starts_with("SELECT * FROM ML.PREDICT(MODEL `proj.ds.model`"));
        for name in FEATURE_COLUMNS {
            assert!(query.contains(&format!("@{name} AS {name}")));
        }
    }

    #[test]
    fn test_request_carries_parameter_values() {
        let config = PredictionConfig {
            project_id: "proj".to_string(),
            ..Default::default()
        };
        let backend = BigQueryBackend::new(&config).unwrap();
        let features = FeatureVector {
            ampersand_count: 2.0,
            tld_legitimate_prob: 0.5,
            ..Default::default()
        };

        let request = serde_json::to_value(backend.build_request("ds.model", &features)).unwrap();
        assert_eq!(request["parameterMode"], "NAMED");
        assert_eq!(request["useLegacySql"], false);

        let params = request["queryParameters"].as_array().unwrap();
        assert_eq!(params.len(), 16);
        assert_eq!(params[1]["name"], "NoOfAmpersandInURL");
        assert_eq!(params[1]["parameterType"]["type"], "FLOAT64");
        assert_eq!(params[1]["parameterValue"]["value"], "2");
        assert_eq!(params[2]["parameterValue"]["value"], "0.5");
    }

    #[test]
    fn test_extract_label() {
        let label = extract_label(response(serde_json::json!({
            "jobComplete": true,
            "schema": {"fields": [{"name": "predicted_label", "type": "STRING"}, {"name": "IsDomainIP"}]},
            "rows": [{"f": [{"v": "phishing"}, {"v": "0"}]}]
        })))
        .unwrap();
        assert_eq!(label, "phishing");
    }

    #[test]
    fn test_integer_label_stays_a_number() {
        let label = extract_label(response(serde_json::json!({
            "jobComplete": true,
            "schema": {"fields": [{"name": "predicted_label", "type": "INTEGER"}]},
            "rows": [{"f": [{"v": "0"}]}, {"f": [{"v": "1"}]}]
        })))
        .unwrap();
        assert_eq!(label, serde_json::json!(1));
        assert_eq!(serde_json::to_string(&label).unwrap(), "1");
    }

    #[test]
    fn test_typed_cells() {
        let cell = |v: &str| Value::from(v);
        assert_eq!(typed_cell("INT64", &cell("-3")), serde_json::json!(-3));
        assert_eq!(typed_cell("FLOAT64", &cell("0.25")), serde_json::json!(0.25));
        assert_eq!(typed_cell("NUMERIC", &cell("2")), serde_json::json!(2));
        assert_eq!(typed_cell("BOOLEAN", &cell("true")), serde_json::json!(true));
        assert_eq!(typed_cell("STRING", &cell("1")), serde_json::json!("1"));
        assert_eq!(typed_cell("INTEGER", &cell("n/a")), serde_json::json!("n/a"));
    }

    #[test]
    fn test_null_label_is_null() {
        let label = extract_label(response(serde_json::json!({
            "jobComplete": true,
            "schema": {"fields": [{"name": "predicted_label", "type": "INTEGER"}]},
            "rows": [{"f": [{"v": null}]}]
        })))
        .unwrap();
        assert!(label.is_null());
    }

    #[test]
    fn test_missing_label_column() {
        let label = extract_label(response(serde_json::json!({
            "jobComplete": true,
            "schema": {"fields": [{"name": "score"}]},
            "rows": [{"f": [{"v": "0.3"}]}]
        })))
        .unwrap();
        assert_eq!(label, NO_PREDICTION);
    }

    #[test]
    fn test_no_rows() {
        let label = extract_label(response(serde_json::json!({"jobComplete": true}))).unwrap();
        assert_eq!(label, NO_PREDICTION);
    }

    #[test]
    fn test_incomplete_job() {
        let err = extract_label(response(serde_json::json!({"jobComplete": false}))).unwrap_err();
        assert!(matches!(err, PredictError::Incomplete));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_model_identifier() {
        let backend = BigQueryBackend::new(&PredictionConfig::default()).unwrap();
        let err = backend
            .predict("ds.model`) --", &FeatureVector::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::Malformed(_)));
    }
}
