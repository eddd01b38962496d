use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Root of the Wikimedia REST API, without the `/metrics/...` suffix.
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    /// Wiki project queried upstream (e.g. `en.wikipedia`).
    #[serde(default = "default_project")]
    pub project: String,
    /// User-Agent sent upstream. Wikimedia rejects requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upper bound on a single upstream call, in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    /// Maximum upstream calls in flight for one request.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Upper bound on handling one inbound request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: 30).
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Log output format: `text` (default) or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Allowed CORS origin. If not set, any origin may read the API.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_upstream_base_url() -> String {
    "https://wikimedia.org/api/rest_v1".to_string()
}

fn default_project() -> String {
    "en.wikipedia".to_string()
}

fn default_user_agent() -> String {
    concat!("pageview-stats/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_upstream_timeout_secs() -> u64 {
    10
}

const fn default_max_concurrent_fetches() -> usize {
    5
}

const fn default_request_timeout_secs() -> u64 {
    120
}

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upstream_base_url: default_upstream_base_url(),
            project: default_project(),
            user_agent: default_user_agent(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            log_format: default_log_format(),
            cors_origin: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `PAGEVIEW_HOST` → host
    /// - `PAGEVIEW_PORT` → port
    /// - `PAGEVIEW_UPSTREAM_URL` → upstream_base_url
    /// - `PAGEVIEW_PROJECT` → project
    /// - `PAGEVIEW_USER_AGENT` → user_agent
    /// - `PAGEVIEW_UPSTREAM_TIMEOUT` → upstream_timeout_secs
    /// - `PAGEVIEW_MAX_CONCURRENT` → max_concurrent_fetches
    /// - `PAGEVIEW_REQUEST_TIMEOUT` → request_timeout_secs
    /// - `PAGEVIEW_SHUTDOWN_TIMEOUT` → shutdown_timeout_secs
    /// - `PAGEVIEW_LOG_FORMAT` → log_format
    /// - `PAGEVIEW_CORS_ORIGIN` → cors_origin
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        // Environment variable overrides
        if let Ok(host) = std::env::var("PAGEVIEW_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PAGEVIEW_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(url) = std::env::var("PAGEVIEW_UPSTREAM_URL") {
            config.upstream_base_url = url;
        }
        if let Ok(project) = std::env::var("PAGEVIEW_PROJECT") {
            config.project = project;
        }
        if let Ok(ua) = std::env::var("PAGEVIEW_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Ok(val) = std::env::var("PAGEVIEW_UPSTREAM_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.upstream_timeout_secs = t;
            }
        }
        if let Ok(val) = std::env::var("PAGEVIEW_MAX_CONCURRENT") {
            if let Ok(n) = val.parse() {
                config.max_concurrent_fetches = n;
            }
        }
        if let Ok(val) = std::env::var("PAGEVIEW_REQUEST_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.request_timeout_secs = t;
            }
        }
        if let Ok(val) = std::env::var("PAGEVIEW_SHUTDOWN_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.shutdown_timeout_secs = t;
            }
        }
        if let Ok(val) = std::env::var("PAGEVIEW_LOG_FORMAT") {
            config.log_format = val;
        }
        if let Ok(origin) = std::env::var("PAGEVIEW_CORS_ORIGIN") {
            config.cors_origin = Some(origin);
        }

        config
    }

    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
