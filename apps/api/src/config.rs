use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::export::raster::default_font_paths;
use crate::preview::DEFAULT_DEBOUNCE;
use crate::session::DEFAULT_IDLE_TTL;

/// Application configuration loaded from environment variables.
/// Everything has a default; without `DATABASE_URL` drafts live in memory.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub raster_font_regular: PathBuf,
    pub raster_font_bold: PathBuf,
    pub preview_debounce: Duration,
    pub session_idle_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let (default_regular, default_bold) = default_font_paths();
        let preview_debounce = match optional_env("PREVIEW_DEBOUNCE_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse::<u64>()
                    .context("PREVIEW_DEBOUNCE_MS must be a number of milliseconds")?,
            ),
            None => DEFAULT_DEBOUNCE,
        };
        let session_idle_ttl = match optional_env("SESSION_IDLE_TTL_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse::<u64>()
                    .context("SESSION_IDLE_TTL_SECS must be a number of seconds")?,
            ),
            None => DEFAULT_IDLE_TTL,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            raster_font_regular: optional_env("RASTER_FONT_REGULAR")
                .map(PathBuf::from)
                .unwrap_or(default_regular),
            raster_font_bold: optional_env("RASTER_FONT_BOLD")
                .map(PathBuf::from)
                .unwrap_or(default_bold),
            preview_debounce,
            session_idle_ttl,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
