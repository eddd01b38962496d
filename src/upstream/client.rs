use super::{ArticleRecord, PageviewSource, Target, UpstreamError};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

/// Response of the "top articles" endpoint for one day.
#[derive(Debug, Deserialize)]
struct TopResponse {
    items: Vec<TopItem>,
}

#[derive(Debug, Deserialize)]
struct TopItem {
    articles: Vec<TopArticle>,
}

#[derive(Debug, Deserialize)]
struct TopArticle {
    article: String,
    views: u64,
}

/// Response of the per-article daily pageviews endpoint.
#[derive(Debug, Deserialize)]
struct DailyResponse {
    items: Vec<DailyItem>,
}

#[derive(Debug, Deserialize)]
struct DailyItem {
    article: String,
    timestamp: String,
    views: u64,
}

/// HTTP client for the Wikimedia REST pageviews API.
#[derive(Clone)]
pub struct WikimediaClient {
    http: Client,
    base_url: Url,
    project: String,
}

impl WikimediaClient {
    /// Build a client rooted at `base_url` (e.g. `https://wikimedia.org/api/rest_v1`).
    ///
    /// `timeout` bounds every individual request, connect included.
    pub fn new(
        base_url: &str,
        project: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| UpstreamError::Malformed(format!("invalid base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Malformed(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            project: project.to_string(),
        })
    }

    /// Build the upstream URL for a target. Each segment is percent-encoded on its own.
    pub fn target_url(&self, target: &Target) -> Url {
        let segments: Vec<String> = match target {
            Target::Day(day) => vec![
                "metrics".into(),
                "pageviews".into(),
                "top".into(),
                self.project.clone(),
                "all-access".into(),
                day.format("%Y").to_string(),
                day.format("%m").to_string(),
                day.format("%d").to_string(),
            ],
            Target::Span {
                article,
                start,
                end,
            } => vec![
                "metrics".into(),
                "pageviews".into(),
                "per-article".into(),
                self.project.clone(),
                "all-access".into(),
                "all-agents".into(),
                article.clone(),
                "daily".into(),
                start.format("%Y%m%d00").to_string(),
                end.format("%Y%m%d00").to_string(),
            ],
        };

        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&segments);
        }
        url
    }
}

#[async_trait]
impl PageviewSource for WikimediaClient {
    async fn fetch(&self, target: &Target) -> Result<Vec<ArticleRecord>, UpstreamError> {
        let url = self.target_url(target);
        tracing::debug!(url = %url, "Querying upstream");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        match target {
            Target::Day(day) => parse_top_articles(&body, *day),
            Target::Span { .. } => parse_daily_views(&body),
        }
    }
}

/// Decode a "top articles" payload, stamping every record with `day`.
fn parse_top_articles(body: &[u8], day: NaiveDate) -> Result<Vec<ArticleRecord>, UpstreamError> {
    let parsed: TopResponse =
        serde_json::from_slice(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    let item = parsed
        .items
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed("top articles response has no items".into()))?;
    Ok(item
        .articles
        .into_iter()
        .map(|a| ArticleRecord {
            article: a.article,
            views: a.views,
            day: Some(day),
        })
        .collect())
}

/// Decode a per-article daily payload. Timestamps look like `2023091500`.
fn parse_daily_views(body: &[u8]) -> Result<Vec<ArticleRecord>, UpstreamError> {
    let parsed: DailyResponse =
        serde_json::from_slice(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    parsed
        .items
        .into_iter()
        .map(|item| {
            let day = item
                .timestamp
                .get(..8)
                .and_then(|ymd| NaiveDate::parse_from_str(ymd, "%Y%m%d").ok())
                .ok_or_else(|| {
                    UpstreamError::Malformed(format!("bad timestamp {}", item.timestamp))
                })?;
            Ok(ArticleRecord {
                article: item.article,
                views: item.views,
                day: Some(day),
            })
        })
        .collect()
}
