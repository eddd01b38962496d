pub mod client;
pub mod fetcher;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

/// One unit of upstream work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Most viewed articles for a single day.
    Day(NaiveDate),
    /// Daily views of one article across an inclusive date span.
    Span {
        article: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day(day) => write!(f, "top articles for {day}"),
            Self::Span {
                article,
                start,
                end,
            } => write!(f, "daily views of {article} from {start} to {end}"),
        }
    }
}

/// A view count for one article, optionally tied to the day it was counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub article: String,
    pub views: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<NaiveDate>,
}

/// Failure of a single upstream call.
#[derive(Debug)]
pub enum UpstreamError {
    Request(reqwest::Error),
    Status(u16),
    Malformed(String),
    Timeout,
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request failed: {e}"),
            Self::Status(code) => write!(f, "upstream returned status {code}"),
            Self::Malformed(msg) => write!(f, "malformed upstream payload: {msg}"),
            Self::Timeout => write!(f, "upstream call timed out"),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Request(e)
        }
    }
}

/// A source of article view records.
///
/// Implementations perform exactly one attempt per call; retrying is the
/// caller's decision and nothing in this crate does it.
#[async_trait]
pub trait PageviewSource: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<Vec<ArticleRecord>, UpstreamError>;
}
