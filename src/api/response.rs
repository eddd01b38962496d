use crate::query::aggregate::AggregatedResult;
use crate::query::window::Period;
use chrono::NaiveDate;
use serde::Serialize;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

/// `{status: "success", period?, data}` envelope.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    pub data: AggregatedResult,
}

/// `{status: "error", data: {message}}` envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub data: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// Wrap an aggregation result. `period` is omitted for endpoints that
/// always use a fixed window.
pub const fn success(data: AggregatedResult, period: Option<Period>) -> SuccessResponse {
    SuccessResponse {
        status: STATUS_SUCCESS,
        period,
        data,
    }
}

pub fn error(message: impl Into<String>) -> ErrorResponse {
    ErrorResponse {
        status: STATUS_ERROR,
        data: ErrorMessage {
            message: message.into(),
        },
    }
}

/// Message returned for any date that is not strict `YYYY-MM-DD`.
pub fn invalid_date_message(today: NaiveDate) -> String {
    format!(
        "Invalid date provided. Please use YYYY-MM-DD (eg. {}) format.",
        today.format("%Y-%m-%d")
    )
}
