use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub admin_key: String,
    /// Extra premium keys from the environment, comma-separated.
    /// Merged with the fixed demo keys in `usage::resolve_tier`.
    pub premium_keys: Vec<String>,
    pub feedback_log_path: String,
    /// Stage-1 confidence below this value pauses for user confirmation.
    pub confidence_threshold: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            admin_key: require_env("ADMIN_KEY")?,
            premium_keys: std::env::var("PREMIUM_KEYS")
                .map(|raw| {
                    raw.split(',')
                        .map(|k| k.trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            feedback_log_path: std::env::var("FEEDBACK_LOG_PATH")
                .unwrap_or_else(|_| "data/feedback/feedback.jsonl".to_string()),
            confidence_threshold: std::env::var("CONFIDENCE_THRESHOLD")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse::<f64>()
                .context("CONFIDENCE_THRESHOLD must be a number between 0 and 1")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
