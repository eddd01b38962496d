use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use pageview_stats::api::articles::AppState;
use pageview_stats::config::Config;
use pageview_stats::server::build_router;
use pageview_stats::upstream::client::WikimediaClient;
use pageview_stats::upstream::fetcher::ConcurrentFetcher;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Top articles for any day: "A" gets 10 views and "B" gets 5, except on the
/// 3rd and 5th of the month which fail with a 500.
async fn top_articles(
    Path((_project, _y, _m, d)): Path<(String, String, String, String)>,
) -> axum::response::Response {
    if d == "03" || d == "05" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(serde_json::json!({
        "items": [{
            "project": "en.wikipedia",
            "access": "all-access",
            "articles": [
                { "article": "A", "views": 10, "rank": 1 },
                { "article": "B", "views": 5, "rank": 2 }
            ]
        }]
    }))
    .into_response()
}

/// Daily views for one article. "Missing_Page" is unknown upstream; other
/// titles get `day_of_month` views, with the 20th and 27th tied as the peak.
async fn per_article(
    Path((_project, article, start, end)): Path<(String, String, String, String)>,
) -> axum::response::Response {
    if article == "Missing_Page" {
        return StatusCode::NOT_FOUND.into_response();
    }
    let first: u32 = start[6..8].parse().unwrap();
    let last: u32 = end[6..8].parse().unwrap();
    let prefix = &start[..6];
    let items: Vec<serde_json::Value> = (first..=last)
        .map(|day| {
            let views = if day == 20 || day == 27 { 100 } else { day };
            serde_json::json!({
                "project": "en.wikipedia",
                "article": article,
                "granularity": "daily",
                "timestamp": format!("{prefix}{day:02}00"),
                "access": "all-access",
                "agent": "all-agents",
                "views": views
            })
        })
        .collect();
    Json(serde_json::json!({ "items": items })).into_response()
}

async fn spawn_mock_upstream() -> String {
    let router = Router::new()
        .route(
            "/api/rest_v1/metrics/pageviews/top/{project}/all-access/{y}/{m}/{d}",
            get(top_articles),
        )
        .route(
            "/api/rest_v1/metrics/pageviews/per-article/{project}/all-access/all-agents/{article}/daily/{start}/{end}",
            get(per_article),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api/rest_v1")
}

async fn make_app() -> Router {
    let base = spawn_mock_upstream().await;
    let config = Config {
        upstream_base_url: base,
        ..Config::default()
    };
    let client = WikimediaClient::new(
        &config.upstream_base_url,
        &config.project,
        &config.user_agent,
        Duration::from_secs(5),
    )
    .unwrap();
    let fetcher = ConcurrentFetcher::new(
        Arc::new(client),
        config.max_concurrent_fetches,
        Duration::from_secs(5),
    );
    build_router(Arc::new(AppState::new(fetcher)), &config)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_most_viewed_monthly_skips_failed_days() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/most-viewed/2023-09-15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["period"], "monthly");
    // 30 days minus the two failing ones.
    assert_eq!(
        json["data"],
        serde_json::json!([
            { "article": "A", "views": 280 },
            { "article": "B", "views": 140 }
        ])
    );
}

#[tokio::test]
async fn test_most_viewed_weekly() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/most-viewed/2023-09-15?period=weekly").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["period"], "weekly");
    // 2023-09-11..2023-09-17 contains no failing day.
    assert_eq!(
        json["data"][0],
        serde_json::json!({ "article": "A", "views": 70 })
    );
}

#[tokio::test]
async fn test_article_views_weekly_total() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/Albert_Einstein/2023-09-15?period=weekly").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["period"], "weekly");
    assert_eq!(json["data"]["article"], "Albert_Einstein");
    // Days 11..=17.
    assert_eq!(json["data"]["views"], 98);
}

#[tokio::test]
async fn test_article_views_monthly_total() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/Albert_Einstein/2023-09-15").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["period"], "monthly");
    // Sum of 1..=30 with days 20 and 27 replaced by 100.
    assert_eq!(json["data"]["views"], 465 - 20 - 27 + 200);
}

#[tokio::test]
async fn test_article_top_day_prefers_earliest_peak() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/Albert_Einstein/2023-09-15/most").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.get("period").is_none());
    assert_eq!(
        json["data"],
        serde_json::json!({
            "article": "Albert_Einstein",
            "date_most_views": "2023-09-20",
            "views": 100
        })
    );
}

#[tokio::test]
async fn test_unknown_article_is_bad_gateway() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/Missing_Page/2023-09-15").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["status"], "error");
    assert!(json["data"]["message"]
        .as_str()
        .unwrap()
        .contains("Missing_Page"));
}

#[tokio::test]
async fn test_invalid_date_message_uses_today() {
    let app = make_app().await;
    let (status, json) = get_json(app, "/articles/most-viewed/2X23-09-15").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d");
    assert_eq!(
        json,
        serde_json::json!({
            "status": "error",
            "data": {
                "message": format!("Invalid date provided. Please use YYYY-MM-DD (eg. {today}) format.")
            }
        })
    );
}
