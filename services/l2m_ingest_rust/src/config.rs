use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    /// Directory of cached raw reports (`<game_id>.json`), written by the
    /// fetch step.
    pub reports_dir: PathBuf,
    /// Process at most this many reports; 0 means all of them.
    pub ingest_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let reports_dir = env::var("REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("raw_reports_json"));

        let ingest_limit = parse_usize_env("INGEST_LIMIT", 0).context("INGEST_LIMIT")?;

        Ok(Self {
            database_url,
            openai_api_key,
            reports_dir,
            ingest_limit,
        })
    }
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>()
        .with_context(|| format!("Invalid {key}: {raw} (expected integer)"))
}
