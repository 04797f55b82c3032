use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub redis_url: String,
    pub port: u16,
    pub rust_log: String,

    /// Directory where profile uploads (CV PDFs) are stored. Shared volume
    /// with the service that accepts the upload.
    pub upload_dir: String,

    /// OpenRouter credentials. Empty key means generation is disabled and
    /// pipelines degrade to score-only output.
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub openrouter_timeout_secs: u64,

    /// Per-command-kind pipeline deadlines enforced by the supervisor.
    pub analysis_timeout_secs: u64,
    pub cv_parse_timeout_secs: u64,

    /// Upper bound on concurrently running pipeline tasks.
    pub max_inflight_tasks: usize,

    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    pub adzuna_country: String,
    pub scrape_interval_hours: f64,

    /// Lowercased keywords that disqualify a posting from ingestion.
    pub red_flag_keywords: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: require_env("REDIS_URL")?,
            port: parse_env("PORT", 8083)?,
            rust_log: optional_env("RUST_LOG", "info"),
            upload_dir: optional_env("UPLOAD_DIR", "/app/uploads"),
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            openrouter_base_url: optional_env(
                "OPENROUTER_BASE_URL",
                "https://openrouter.ai/api/v1",
            ),
            openrouter_model: optional_env(
                "OPENROUTER_MODEL",
                "meta-llama/llama-3.3-70b-instruct",
            ),
            openrouter_timeout_secs: parse_env("OPENROUTER_TIMEOUT_SECONDS", 45)?,
            analysis_timeout_secs: parse_env("ANALYSIS_TIMEOUT_SECONDS", 120)?,
            cv_parse_timeout_secs: parse_env("CV_PARSE_TIMEOUT_SECONDS", 120)?,
            max_inflight_tasks: parse_env("MAX_INFLIGHT_TASKS", 8)?,
            adzuna_app_id: std::env::var("ADZUNA_APP_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            adzuna_app_key: std::env::var("ADZUNA_APP_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            adzuna_country: optional_env("ADZUNA_COUNTRY", "fr"),
            scrape_interval_hours: parse_env("SCRAPE_INTERVAL_HOURS", 6.0)?,
            red_flag_keywords: parse_red_flags(&optional_env(
                "RED_FLAG_KEYWORDS",
                "mlm,multi-level,pyramid,scheme,unpaid,commission only,no base salary",
            )),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}

fn parse_red_flags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}
