use pageview_stats::api::articles::AppState;
use pageview_stats::config::Config;
use pageview_stats::server;
use pageview_stats::upstream::client::WikimediaClient;
use pageview_stats::upstream::fetcher::ConcurrentFetcher;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pageview_stats=info,tower_http=info".into());
    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        host = %config.host,
        port = config.port,
        upstream = %config.upstream_base_url,
        project = %config.project,
        max_concurrent_fetches = config.max_concurrent_fetches,
        "Starting pageview stats service"
    );

    let client = WikimediaClient::new(
        &config.upstream_base_url,
        &config.project,
        &config.user_agent,
        config.upstream_timeout(),
    )
    .unwrap_or_else(|e| panic!("Failed to build upstream client: {e}"));
    let fetcher = ConcurrentFetcher::new(
        Arc::new(client),
        config.max_concurrent_fetches,
        config.upstream_timeout(),
    );
    let state = Arc::new(AppState::new(fetcher));

    let app = server::build_router(state, &config);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .expect("Server error");
}

/// Resolves on Ctrl-C or SIGTERM. Once triggered, a watchdog forces the
/// process to exit if in-flight requests outlive `timeout`.
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Shutdown signal received, draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!("Graceful shutdown timed out, exiting");
        std::process::exit(1);
    });
}
