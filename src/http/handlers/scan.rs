//! Scan handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use super::{AppState, MAX_URL_LENGTH};
use crate::http::types::{AutoScanRequest, ErrorResponse};
use crate::prediction::DispatchError;
use crate::types::FeatureVector;

/// Extract features from a URL and classify them with every model
pub async fn automatic_ai_scan(
    State(state): State<AppState>,
    payload: Result<Json<AutoScanRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject_body(rejection),
    };

    if request.url.len() > MAX_URL_LENGTH {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "URL length {} exceeds maximum allowed length of {} bytes",
                request.url.len(),
                MAX_URL_LENGTH
            ))),
        )
            .into_response();
    }

    debug!("HTTP automatic scan request: url={}", request.url);
    let features = state.extractor.extract(&request.url).await;
    classify(&state, &features).await
}

/// Classify a caller-supplied feature vector with every model
pub async fn manual_ai_scan(
    State(state): State<AppState>,
    payload: Result<Json<FeatureVector>, JsonRejection>,
) -> Response {
    let features = match payload {
        Ok(Json(features)) => features,
        Err(rejection) => return reject_body(rejection),
    };

    debug!("HTTP manual scan request");
    classify(&state, &features).await
}

/// Answer an unreadable request body in the API's `{"detail": ...}` shape
fn reject_body(rejection: JsonRejection) -> Response {
    debug!("Rejected request body: {}", rejection.body_text());
    (rejection.status(), Json(ErrorResponse::new(rejection.body_text()))).into_response()
}

async fn classify(state: &AppState, features: &FeatureVector) -> Response {
    match state.dispatcher.dispatch(features).await {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(e @ DispatchError::NonFiniteFeature(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response(),
        Err(e) => {
            error!("General error during URL scanning: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::scan_failed(e)),
            )
                .into_response()
        }
    }
}
