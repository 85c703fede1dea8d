use std::time::Duration;

use crate::models::session::{Role, Session};

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST backend, always ending in `/`.
    pub api_url: String,
    /// Status endpoint. Defaults to `<api_url>status/`.
    pub status_url: String,
    pub token: Option<String>,
    pub username: String,
    pub role: Role,
    /// Update detector cadence. Set via TIDINGS_POLL_INTERVAL_SECS. Default: 30.
    pub poll_interval: Duration,
    /// Delay before the detector's first run. Set via TIDINGS_STARTUP_DELAY_MS. Default: 3000.
    pub startup_delay: Duration,
    /// Unread-count refresh cadence. Set via TIDINGS_FEED_INTERVAL_SECS. Default: 30.
    pub feed_interval: Duration,
    /// Seen-registry backend, e.g. `file://.tidings/seen_releases.json` or `redis://127.0.0.1:6379`.
    pub seen_store: String,
    pub http_timeout: Duration,
    /// Retries for transient HTTP failures. 0 = disabled.
    pub http_retries: u32,
    pub log_json: bool,
}

impl Config {
    /// Session described by the environment, if a token is configured.
    pub fn session(&self) -> Option<Session> {
        self.token.as_ref().map(|token| Session {
            username: self.username.clone(),
            role: self.role,
            token: token.clone(),
        })
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let api_url = with_trailing_slash(
        std::env::var("TIDINGS_API_URL").unwrap_or_else(|_| "http://localhost:8000/api/".into()),
    );
    url::Url::parse(&api_url)
        .map_err(|e| anyhow::anyhow!("TIDINGS_API_URL '{}' is not a valid url: {}", api_url, e))?;

    let status_url = std::env::var("TIDINGS_STATUS_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("{}status/", api_url));

    let role = match std::env::var("TIDINGS_ROLE") {
        Ok(r) => r.parse::<Role>().map_err(anyhow::Error::msg)?,
        Err(_) => Role::User,
    };

    Ok(Config {
        api_url,
        status_url,
        token: std::env::var("TIDINGS_TOKEN").ok().filter(|t| !t.is_empty()),
        username: std::env::var("TIDINGS_USERNAME").unwrap_or_else(|_| "reader".into()),
        role,
        poll_interval: Duration::from_secs(env_u64("TIDINGS_POLL_INTERVAL_SECS", 30).max(1)),
        startup_delay: Duration::from_millis(env_u64("TIDINGS_STARTUP_DELAY_MS", 3000)),
        feed_interval: Duration::from_secs(env_u64("TIDINGS_FEED_INTERVAL_SECS", 30).max(1)),
        seen_store: std::env::var("TIDINGS_SEEN_STORE")
            .unwrap_or_else(|_| "file://.tidings/seen_releases.json".into()),
        http_timeout: Duration::from_secs(env_u64("TIDINGS_HTTP_TIMEOUT_SECS", 10)),
        http_retries: env_u64("TIDINGS_HTTP_RETRIES", 2) as u32,
        log_json: std::env::var("TIDINGS_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false),
    })
}
