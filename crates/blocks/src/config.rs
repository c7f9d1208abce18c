//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;

use crate::block::RenderSettings;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. When None, posts are served from an
    /// in-memory store.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Public site URL used to build permalinks (default: http://localhost:3000).
    pub site_url: String,

    /// chrono format for displayed post dates (default: "%B %-d, %Y").
    pub date_format: String,

    /// Site timezone offset applied to post dates (default: +00:00).
    pub utc_offset: FixedOffset,

    /// Interface language for translated strings (default: en).
    pub language: String,

    /// Directory of `{language}.po` catalogs. Optional.
    pub locale_dir: Option<PathBuf>,

    /// JSON fixture loaded into the in-memory store. Optional.
    pub fixture_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = var("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let site_url = var("SITE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let date_format = var("DATE_FORMAT").unwrap_or_else(|| "%B %-d, %Y".to_string());
        RenderSettings::validate_date_format(&date_format)
            .map_err(|e| anyhow!(e))
            .context("DATE_FORMAT must be a valid chrono format")?;

        let utc_offset = RenderSettings::parse_utc_offset(
            &var("SITE_UTC_OFFSET").unwrap_or_else(|| "+00:00".to_string()),
        )
        .map_err(|e| anyhow!(e))
        .context("SITE_UTC_OFFSET must look like +HH:MM")?;

        // `LANGUAGE` is gettext's own variable (`en_US:en` style lists).
        let language = var("SITE_LANGUAGE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "en".to_string());

        let locale_dir = var("LOCALE_DIR").map(PathBuf::from);
        let fixture_path = var("POSTS_FIXTURE").map(PathBuf::from);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            site_url,
            date_format,
            utc_offset,
            language,
            locale_dir,
            fixture_path,
        })
    }

    /// Block rendering settings derived from this configuration.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            date_format: self.date_format.clone(),
            utc_offset: self.utc_offset,
            language: self.language.clone(),
        }
    }
}
