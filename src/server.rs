use crate::api::articles::{self, AppState};
use crate::config::Config;
use axum::http::{header, HeaderValue, Method};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>, config: &Config) -> Router {
    let article_routes = Router::new()
        .route("/articles/most-viewed", get(articles::most_viewed_today))
        .route("/articles/most-viewed/{date}", get(articles::most_viewed))
        .route("/articles/{title}/{date}", get(articles::article_views))
        .route(
            "/articles/{title}/{date}/most",
            get(articles::article_top_day),
        )
        .layer(build_cors(config.cors_origin.as_deref()));

    Router::new()
        .route("/health", get(health_check))
        .merge(article_routes)
        .layer(axum::middleware::map_response(add_security_headers))
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inject baseline security headers on every HTTP response.
async fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

/// Build a read-only CORS layer for the article routes.
fn build_cors(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(allowed) => layer.allow_origin(allowed),
        None => layer.allow_origin(Any),
    }
}

/// GET /health — Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
