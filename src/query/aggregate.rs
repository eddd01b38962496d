use crate::upstream::fetcher::Payload;
use crate::upstream::ArticleRecord;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Total views for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleViews {
    pub article: String,
    pub views: u64,
}

/// The single day on which an article was viewed the most.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDay {
    pub article: String,
    #[serde(rename = "date_most_views")]
    pub date: NaiveDate,
    pub views: u64,
}

/// Result of an aggregation, serialized as the `data` field of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AggregatedResult {
    RankedList(Vec<ArticleViews>),
    ArticleTotal(ArticleViews),
    TopDay(TopDay),
}

/// Raised when a single-article query has nothing to aggregate. Holds the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUnavailable(pub String);

impl std::fmt::Display for DataUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DataUnavailable {}

#[derive(Debug, Clone, Copy)]
struct Tally {
    views: u64,
    /// (slot, position within the slot) of the first sighting in canonical order.
    first_seen: (usize, usize),
}

/// Per-article view totals shared between concurrently completing fetches.
///
/// Updates are commutative: totals are sums and the first-seen position is a
/// minimum, so the final ranking does not depend on arrival order.
#[derive(Debug, Default)]
pub struct ArticleTally {
    totals: Mutex<HashMap<String, Tally>>,
}

impl ArticleTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one slot's records into the tally.
    pub fn record(&self, slot: usize, records: &[ArticleRecord]) {
        let mut totals = self.totals.lock();
        for (pos, rec) in records.iter().enumerate() {
            let seen = (slot, pos);
            totals
                .entry(rec.article.clone())
                .and_modify(|t| {
                    t.views = t.views.saturating_add(rec.views);
                    t.first_seen = t.first_seen.min(seen);
                })
                .or_insert(Tally {
                    views: rec.views,
                    first_seen: seen,
                });
        }
    }

    pub fn len(&self) -> usize {
        self.totals.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.lock().is_empty()
    }

    /// Articles sorted by total views descending; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<ArticleViews> {
        let mut rows: Vec<(String, Tally)> = self
            .totals
            .lock()
            .iter()
            .map(|(article, tally)| (article.clone(), *tally))
            .collect();
        rows.sort_by_key(|(_, t)| t.first_seen);
        rows.sort_by(|a, b| b.1.views.cmp(&a.1.views));
        rows.into_iter()
            .map(|(article, t)| ArticleViews {
                article,
                views: t.views,
            })
            .collect()
    }
}

/// Sum views per article across payloads and rank the result.
pub fn sum_by_article(payloads: &[Payload]) -> Vec<ArticleViews> {
    let tally = ArticleTally::new();
    for payload in payloads {
        tally.record(payload.slot, &payload.records);
    }
    tally.ranked()
}

fn no_views(article: &str) -> DataUnavailable {
    DataUnavailable(format!("no daily views returned for {article}"))
}

/// Sum one article's daily views over the whole span.
///
/// The reported title is the one the upstream returned, falling back to the
/// requested title only when no record carries one.
pub fn total_views(
    requested: &str,
    records: &[ArticleRecord],
) -> Result<ArticleViews, DataUnavailable> {
    let first = records.first().ok_or_else(|| no_views(requested))?;
    let views = records
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.views));
    Ok(ArticleViews {
        article: if first.article.is_empty() {
            requested.to_string()
        } else {
            first.article.clone()
        },
        views,
    })
}

/// Find the day with the most views. The earliest day wins a tie.
pub fn top_day(requested: &str, records: &[ArticleRecord]) -> Result<TopDay, DataUnavailable> {
    let mut dated: Vec<(NaiveDate, &ArticleRecord)> = records
        .iter()
        .filter_map(|r| r.day.map(|d| (d, r)))
        .collect();
    dated.sort_by_key(|(day, _)| *day);

    let mut best: Option<(NaiveDate, &ArticleRecord)> = None;
    for (day, rec) in dated {
        if best.is_none_or(|(_, b)| rec.views > b.views) {
            best = Some((day, rec));
        }
    }

    let (date, rec) = best.ok_or_else(|| no_views(requested))?;
    Ok(TopDay {
        article: if rec.article.is_empty() {
            requested.to_string()
        } else {
            rec.article.clone()
        },
        date,
        views: rec.views,
    })
}
