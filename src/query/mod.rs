pub mod aggregate;
pub mod window;

use crate::upstream::fetcher::ConcurrentFetcher;
use crate::upstream::Target;
use aggregate::{ArticleTally, ArticleViews, DataUnavailable, TopDay};
use chrono::NaiveDate;
use std::sync::Arc;
use window::Period;

/// Most viewed articles across the window around `reference`.
///
/// One "top articles" query per day fans out concurrently; each completed
/// day is folded straight into a shared tally. Days that fail are skipped.
pub async fn most_viewed(
    fetcher: &ConcurrentFetcher,
    reference: NaiveDate,
    period: Period,
) -> Vec<ArticleViews> {
    let window = window::resolve(reference, period);
    let targets: Vec<Target> = window.iter().map(Target::Day).collect();

    let tally = Arc::new(ArticleTally::new());
    let sink = Arc::clone(&tally);
    let report = fetcher
        .for_each_completed(targets, move |payload| {
            sink.record(payload.slot, &payload.records);
        })
        .await;

    tracing::info!(
        reference = %reference,
        period = period.as_str(),
        days = window.len(),
        succeeded = report.succeeded,
        failed = report.failed,
        articles = tally.len(),
        "Aggregated most viewed articles"
    );
    tally.ranked()
}

/// Total views of one article across the window around `reference`.
pub async fn article_total(
    fetcher: &ConcurrentFetcher,
    article: &str,
    reference: NaiveDate,
    period: Period,
) -> Result<ArticleViews, DataUnavailable> {
    let records = fetch_span(fetcher, article, reference, period).await?;
    aggregate::total_views(article, &records)
}

/// The day of the month around `reference` with the most views of one article.
pub async fn article_top_day(
    fetcher: &ConcurrentFetcher,
    article: &str,
    reference: NaiveDate,
) -> Result<TopDay, DataUnavailable> {
    let records = fetch_span(fetcher, article, reference, Period::Monthly).await?;
    aggregate::top_day(article, &records)
}

/// Single ranged query for one article. There is no fallback source, so an
/// upstream failure becomes a request-level error.
async fn fetch_span(
    fetcher: &ConcurrentFetcher,
    article: &str,
    reference: NaiveDate,
    period: Period,
) -> Result<Vec<crate::upstream::ArticleRecord>, DataUnavailable> {
    let window = window::resolve(reference, period);
    let target = Target::Span {
        article: article.to_string(),
        start: window.first(),
        end: window.last(),
    };
    fetcher.fetch_one(&target).await.map_err(|e| {
        tracing::warn!(article, error = %e, "Per-article fetch failed");
        DataUnavailable(format!("{article}: {e}"))
    })
}
