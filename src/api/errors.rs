use crate::api::response;
use crate::query::aggregate::DataUnavailable;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;

/// API error type with HTTP status code mapping.
#[derive(Debug)]
pub enum ApiError {
    /// The path date was not strict `YYYY-MM-DD`. Carries "today" for the
    /// example in the message.
    InvalidDate { today: NaiveDate },
    DataUnavailable(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate { today } => f.write_str(&response::invalid_date_message(*today)),
            Self::DataUnavailable(msg) => write!(f, "Article data unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidDate { .. } => StatusCode::BAD_REQUEST,
            Self::DataUnavailable(msg) => {
                tracing::warn!(reason = %msg, "Article data unavailable");
                StatusCode::BAD_GATEWAY
            }
        };

        (status, Json(response::error(self.to_string()))).into_response()
    }
}

impl From<DataUnavailable> for ApiError {
    fn from(e: DataUnavailable) -> Self {
        Self::DataUnavailable(e.0)
    }
}
