use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub embedding_api_base: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    /// Directory holding the index blob + job metadata pair.
    pub index_dir: String,
    /// Max in-flight explanation calls per request. Independent of top_k so a
    /// large request cannot amplify external load.
    pub explain_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_api_base: require_env("EMBEDDING_API_BASE")?,
            embedding_api_key: require_env("EMBEDDING_API_KEY")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimensions: std::env::var("EMBEDDING_DIMENSIONS")
                .unwrap_or_else(|_| "768".to_string())
                .parse::<usize>()
                .context("EMBEDDING_DIMENSIONS must be a positive integer")?,
            index_dir: std::env::var("INDEX_DIR").unwrap_or_else(|_| "data/indices".to_string()),
            explain_concurrency: std::env::var("EXPLAIN_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse::<usize>()
                .context("EXPLAIN_CONCURRENCY must be a positive integer")?,
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
