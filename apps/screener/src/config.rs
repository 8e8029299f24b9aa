use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Application configuration loaded from environment variables.
/// Startup fails if a credential is missing; nothing reads the environment afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_model: String,
    pub hiring_access_token: String,
    pub hiring_host: String,
    pub job_bands_path: PathBuf,
    pub hard_rubric_path: Option<PathBuf>,
    pub scoring_delay: Duration,
    pub llm_max_attempts: u32,
    pub listing_page_size: u32,
    pub listing_start_date: NaiveDate,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            hiring_access_token: require_env("BASE_API_KEY")?,
            hiring_host: optional_env("HIRING_HOST")
                .unwrap_or_else(|| "hiring.base.vn".to_string()),
            job_bands_path: optional_env("JOB_BANDS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("job_descriptions.csv")),
            hard_rubric_path: optional_env("HARD_RUBRIC_PATH").map(PathBuf::from),
            scoring_delay: Duration::from_millis(
                parse_env("SCORING_DELAY_MS", 3000)
                    .context("SCORING_DELAY_MS must be a number of milliseconds")?,
            ),
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 1)
                .context("LLM_MAX_ATTEMPTS must be a positive integer")?
                .max(1),
            listing_page_size: parse_env("LISTING_PAGE_SIZE", 10_000)
                .context("LISTING_PAGE_SIZE must be a positive integer")?,
            listing_start_date: match optional_env("LISTING_START_DATE") {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .context("LISTING_START_DATE must be formatted as YYYY-MM-DD")?,
                None => NaiveDate::from_ymd_opt(2023, 11, 1).context("invalid default date")?,
            },
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => Ok(raw.trim().parse::<T>()?),
        None => Ok(default),
    }
}
