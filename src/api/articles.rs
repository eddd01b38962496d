use crate::api::errors::ApiError;
use crate::api::response::{self, SuccessResponse};
use crate::query;
use crate::query::aggregate::AggregatedResult;
use crate::query::window::{parse_reference_date, Period};
use crate::upstream::fetcher::ConcurrentFetcher;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use std::sync::Arc;

/// Shared application state for the article handlers.
pub struct AppState {
    pub fetcher: ConcurrentFetcher,
    /// Supplies "today" for default dates and error messages.
    pub today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(fetcher: ConcurrentFetcher) -> Self {
        Self {
            fetcher,
            today: local_today,
        }
    }

    /// Parse a path date, rejecting anything that is not strict `YYYY-MM-DD`.
    fn reference_date(&self, raw: &str) -> Result<NaiveDate, ApiError> {
        parse_reference_date(raw).ok_or_else(|| {
            tracing::debug!(date = raw, "Rejected invalid date");
            self.invalid_date()
        })
    }

    /// Unwrap path parameters that axum could not decode (e.g. invalid UTF-8)
    /// into the same invalid-date error as a badly shaped date.
    fn path_params<T>(&self, path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
        path.map(|Path(params)| params).map_err(|rejection| {
            tracing::debug!(error = %rejection, "Rejected undecodable path");
            self.invalid_date()
        })
    }

    fn invalid_date(&self) -> ApiError {
        ApiError::InvalidDate {
            today: (self.today)(),
        }
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Query parameters of the windowed endpoints, kept as raw pairs so that
/// repeated or unknown keys never reject the request.
#[derive(Debug, Default)]
pub struct PeriodParams(Vec<(String, String)>);

impl PeriodParams {
    /// The first `period` value wins; anything other than `weekly` is monthly.
    fn period(&self) -> Period {
        let raw = self
            .0
            .iter()
            .find(|(key, _)| key == "period")
            .map(|(_, value)| value.as_str());
        Period::from_param(raw)
    }
}

impl From<Query<Vec<(String, String)>>> for PeriodParams {
    fn from(Query(pairs): Query<Vec<(String, String)>>) -> Self {
        Self(pairs)
    }
}

/// GET /articles/most-viewed/{date} — Articles ranked by total views over the window.
pub async fn most_viewed(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    params: Query<Vec<(String, String)>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let date = state.path_params(path)?;
    let reference = state.reference_date(&date)?;
    let period = PeriodParams::from(params).period();
    Ok(Json(most_viewed_for(&state, reference, period).await))
}

/// GET /articles/most-viewed — Same as above for the window containing today.
pub async fn most_viewed_today(
    State(state): State<Arc<AppState>>,
    params: Query<Vec<(String, String)>>,
) -> Json<SuccessResponse> {
    let reference = (state.today)();
    let period = PeriodParams::from(params).period();
    Json(most_viewed_for(&state, reference, period).await)
}

async fn most_viewed_for(
    state: &AppState,
    reference: NaiveDate,
    period: Period,
) -> SuccessResponse {
    let ranked = query::most_viewed(&state.fetcher, reference, period).await;
    response::success(AggregatedResult::RankedList(ranked), Some(period))
}

/// GET /articles/{title}/{date} — Total views of one article over the window.
pub async fn article_views(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
    params: Query<Vec<(String, String)>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (title, date) = state.path_params(path)?;
    let reference = state.reference_date(&date)?;
    let period = PeriodParams::from(params).period();
    let total = query::article_total(&state.fetcher, &title, reference, period).await?;
    Ok(Json(response::success(
        AggregatedResult::ArticleTotal(total),
        Some(period),
    )))
}

/// GET /articles/{title}/{date}/most — Day of the month with the most views.
pub async fn article_top_day(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (title, date) = state.path_params(path)?;
    let reference = state.reference_date(&date)?;
    let top = query::article_top_day(&state.fetcher, &title, reference).await?;
    Ok(Json(response::success(AggregatedResult::TopDay(top), None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::fetcher::tests::FakeSource;
    use std::time::Duration;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn state() -> AppState {
        let fetcher =
            ConcurrentFetcher::new(Arc::new(FakeSource::default()), 5, Duration::from_secs(1));
        AppState {
            fetcher,
            today: fixed_today,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> PeriodParams {
        PeriodParams(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_reference_date_valid() {
        assert_eq!(
            state().reference_date("2023-09-15").unwrap(),
            NaiveDate::from_ymd_opt(2023, 9, 15).unwrap()
        );
    }

    #[test]
    fn test_reference_date_invalid_carries_today() {
        let err = state().reference_date("2X23-09-15").unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate { today } if today == fixed_today()));
    }

    #[test]
    fn test_period_params_default() {
        assert_eq!(PeriodParams::default().period(), Period::Monthly);
        assert_eq!(params(&[("period", "weekly")]).period(), Period::Weekly);
        assert_eq!(params(&[("period", "Weekly")]).period(), Period::Monthly);
    }

    #[test]
    fn test_period_params_first_occurrence_wins() {
        let weekly_first = params(&[
            ("other", "x"),
            ("period", "weekly"),
            ("period", "monthly"),
        ]);
        assert_eq!(weekly_first.period(), Period::Weekly);
        let monthly_first = params(&[("period", "monthly"), ("period", "weekly")]);
        assert_eq!(monthly_first.period(), Period::Monthly);
    }
}
