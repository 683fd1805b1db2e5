use anyhow::{ensure, Context, Result};

/// One week.
const MAX_SESSION_IDLE_MINUTES: i64 = 7 * 24 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint of the CV-extraction service (multipart `file` upload).
    pub cv_extraction_url: String,
    /// Endpoint of the candidate registration service.
    pub registration_url: String,
    pub port: u16,
    pub rust_log: String,
    pub http_timeout_secs: u64,
    /// Wizard sessions untouched for longer than this are dropped.
    pub session_idle_minutes: i64,
    /// Request body ceiling. Kept above the 5 MB upload rule so oversized
    /// files still reach field validation instead of being cut off by axum.
    pub max_request_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            cv_extraction_url: require_env("CV_EXTRACTION_URL")?,
            registration_url: require_env("REGISTRATION_URL")?,
            port: optional_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            http_timeout_secs: optional_env("HTTP_TIMEOUT_SECS", 60)
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            session_idle_minutes: session_idle_minutes(
                optional_env("SESSION_IDLE_MINUTES", 60)
                    .context("SESSION_IDLE_MINUTES must be a whole number of minutes")?,
            )?,
            max_request_bytes: optional_env("MAX_REQUEST_BYTES", 10 * 1024 * 1024)
                .context("MAX_REQUEST_BYTES must be a byte count")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn session_idle_minutes(minutes: i64) -> Result<i64> {
    ensure!(
        (1..=MAX_SESSION_IDLE_MINUTES).contains(&minutes),
        "SESSION_IDLE_MINUTES must be between 1 and {MAX_SESSION_IDLE_MINUTES}, got {minutes}"
    );
    Ok(minutes)
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}
