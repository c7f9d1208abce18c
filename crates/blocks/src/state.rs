//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::block::{BlockTypeRegistry, standard_registry};
use crate::config::Config;
use crate::content::{InMemoryPostStore, PgPostStore, PostStore};
use crate::db;
use crate::locale::LocaleService;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Registered block types and their render callbacks.
    blocks: BlockTypeRegistry,

    /// PostgreSQL pool, when a database is configured.
    db: Option<PgPool>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Connects to PostgreSQL when `DATABASE_URL` is set; otherwise serves
    /// posts from memory, seeded from the fixture file if one is configured.
    pub async fn new(config: &Config) -> Result<Self> {
        let locale = Arc::new(LocaleService::new());
        if let Some(dir) = &config.locale_dir {
            let catalogs = locale
                .load_dir(dir)
                .context("failed to load translation catalogs")?;
            info!(catalogs, translations = locale.len(), "translations loaded");
        }

        let (store, db): (Arc<dyn PostStore>, Option<PgPool>) = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections).await?;
                info!("PostgreSQL post store connected");
                (
                    Arc::new(PgPostStore::new(pool.clone(), &config.site_url)),
                    Some(pool),
                )
            }
            None => {
                let store = match &config.fixture_path {
                    Some(path) => load_fixture(path)?,
                    None => {
                        warn!("DATABASE_URL not set; serving an empty in-memory post store");
                        InMemoryPostStore::new()
                    }
                };
                (Arc::new(store), None)
            }
        };

        let blocks = standard_registry(store, locale, config.render_settings());
        Ok(Self::from_parts(blocks, db))
    }

    /// Build state from already constructed parts.
    pub fn from_parts(blocks: BlockTypeRegistry, db: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { blocks, db }),
        }
    }

    /// Get the block type registry.
    pub fn blocks(&self) -> &BlockTypeRegistry {
        &self.inner.blocks
    }

    /// PostgreSQL health. None when running without a database.
    pub async fn postgres_healthy(&self) -> Option<bool> {
        match &self.inner.db {
            Some(pool) => Some(db::check_health(pool).await),
            None => None,
        }
    }
}

/// Read a JSON fixture into an in-memory store.
pub fn load_fixture(path: &std::path::Path) -> Result<InMemoryPostStore> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let store = InMemoryPostStore::from_json(&json)
        .with_context(|| format!("invalid fixture {}", path.display()))?;
    info!(posts = store.post_count(), path = %path.display(), "fixture loaded");
    Ok(store)
}
