//! Mapping from library errors to HTTP responses

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use wxmc_common::api::ErrorResponse;
use wxmc_common::markov::ForecastError;
use wxmc_common::Error;

/// Handler error: any [`Error`] rendered as `{error, message}` JSON
#[derive(Debug)]
pub struct ApiError(pub Error);

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Forecast(ForecastError::UnknownCategory { .. }) => StatusCode::NOT_FOUND,
            Error::Forecast(ForecastError::MalformedModel(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Forecast(_) | Error::Dataset(_) | Error::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Database(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Config(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let message = self.0.to_string();
        match &self.0 {
            Error::Forecast(ForecastError::InvalidCategory { labels, allowed }) => {
                ErrorResponse::with_details(
                    "invalid_category",
                    message,
                    json!({ "labels": labels, "allowed": allowed }),
                )
            }
            Error::Forecast(ForecastError::UnknownCategory { category, known }) => {
                ErrorResponse::with_details(
                    "unknown_category",
                    message,
                    json!({ "category": category, "known": known }),
                )
            }
            Error::Forecast(ForecastError::EmptySequence) => {
                ErrorResponse::new("empty_sequence", message)
            }
            Error::Forecast(ForecastError::InvalidHorizon(_)) => {
                ErrorResponse::new("invalid_horizon", message)
            }
            Error::Dataset(_) => ErrorResponse::new("invalid_csv", message),
            Error::InvalidInput(_) => ErrorResponse::new("invalid_input", message),
            Error::NotFound(_) => ErrorResponse::new("not_found", message),
            Error::Conflict(_) => ErrorResponse::new("conflict", message),
            Error::Unauthorized(_) => ErrorResponse::new("unauthorized", message),
            // Storage details stay in the log
            _ => ErrorResponse::new("internal_error", "Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let mut response = (status, Json(self.body())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxmc_common::dataset::DatasetError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::from(ForecastError::EmptySequence), StatusCode::BAD_REQUEST),
            (Error::from(ForecastError::InvalidHorizon(-1)), StatusCode::BAD_REQUEST),
            (
                Error::from(ForecastError::UnknownCategory {
                    category: "hail".into(),
                    known: vec!["sun".into()],
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::from(ForecastError::MalformedModel("row 0".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::from(DatasetError::Empty), StatusCode::BAD_REQUEST),
            (Error::Conflict("email".into()), StatusCode::CONFLICT),
            (Error::Unauthorized("token".into()), StatusCode::UNAUTHORIZED),
            (Error::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_invalid_category_carries_details() {
        let err = ApiError::from(ForecastError::InvalidCategory {
            labels: vec!["cloudy".into()],
            allowed: vec!["rain".into(), "sun".into()],
        });
        let body = err.body();

        assert_eq!(body.error, "invalid_category");
        assert!(body.message.contains("cloudy"));
        assert_eq!(body.details.unwrap()["labels"][0], "cloudy");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let body = ApiError(Error::Config("secret path".into())).body();

        assert_eq!(body.error, "internal_error");
        assert!(!body.message.contains("secret"));
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError(Error::Unauthorized("Invalid or expired token".into())).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
