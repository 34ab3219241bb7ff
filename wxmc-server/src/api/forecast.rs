//! Forecast endpoints: upload, clear, predict and dataset summary

use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use wxmc_common::Error;

use super::{ApiError, AuthUser};
use crate::forecast::{ModelSource, UploadSummary, WeatherData};
use crate::AppState;

/// Multipart field carrying the CSV
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: UploadSummary,
}

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub current_state: String,
    pub n_days: i64,
}

#[derive(Debug, Serialize)]
pub struct PredictionData {
    pub states: Vec<String>,
    pub probabilities: Vec<f64>,
    pub most_likely_state: String,
    pub data_source: ModelSource,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub message: String,
    pub data: PredictionData,
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut csv = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let text = field
                .text()
                .await
                .map_err(|e| Error::InvalidInput(format!("Unreadable upload: {}", e)))?;
            csv = Some(text);
            break;
        }
    }

    let csv = csv.ok_or_else(|| {
        Error::InvalidInput(format!("Missing multipart field '{}'", UPLOAD_FIELD))
    })?;

    let summary = state.forecasts.upload(user_id, &csv).await?;
    Ok(Json(UploadResponse {
        message: "File uploaded and processed successfully".to_string(),
        data: summary,
    }))
}

/// POST /clear
pub async fn clear(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.forecasts.clear(user_id).await?;
    let message = if removed {
        "Uploaded data cleared; using default dataset"
    } else {
        "No uploaded data; using default dataset"
    };
    Ok(Json(json!({ "message": message })))
}

/// GET /predict?current_state=..&n_days=..
///
/// A missing or non-integer parameter is an `invalid_input` 400 like every
/// other client error.
pub async fn predict(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    query: Result<Query<PredictQuery>, QueryRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Query(query) = query.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let forecast = state
        .forecasts
        .predict(user_id, &query.current_state, query.n_days)
        .await?;

    Ok(Json(PredictResponse {
        message: format!("Predictions for {} day(s) ahead", query.n_days),
        data: PredictionData {
            states: forecast.result.categories,
            probabilities: forecast.result.probabilities,
            most_likely_state: forecast.result.most_likely,
            data_source: forecast.source,
        },
    }))
}

/// GET /weather-data
pub async fn weather_data(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<WeatherData>, ApiError> {
    Ok(Json(state.forecasts.weather_data(user_id).await?))
}

/// Routes behind the bearer middleware
pub fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/clear", post(clear))
        .route("/predict", get(predict))
        .route("/weather-data", get(weather_data))
}
