//! CLI command implementations.
//!
//! These commands run without starting the HTTP server.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::block::{Attributes, BlockTypeRegistry, standard_registry};
use crate::config::Config;
use crate::content::{InMemoryPostStore, PgPostStore, PostStore};
use crate::db;
use crate::locale::LocaleService;
use crate::state::{AppState, load_fixture};

/// Render one block and print its markup to stdout.
///
/// With `fixture`, posts come from that JSON file instead of the configured
/// store.
pub async fn cmd_render(
    config: &Config,
    block: &str,
    attributes: Option<&str>,
    fixture: Option<&Path>,
) -> Result<()> {
    let attributes: Attributes = match attributes {
        Some(raw) => serde_json::from_str(raw).context("--attributes must be a JSON object")?,
        None => Attributes::new(),
    };

    let registry = match fixture {
        Some(path) => {
            let store: Arc<dyn PostStore> = Arc::new(load_fixture(path)?);
            let locale = Arc::new(LocaleService::new());
            if let Some(dir) = &config.locale_dir {
                locale.load_dir(dir)?;
            }
            standard_registry(store, locale, config.render_settings())
        }
        None => {
            let state = AppState::new(config).await?;
            return render_with(state.blocks(), block, &attributes).await;
        }
    };

    render_with(&registry, block, &attributes).await
}

async fn render_with(
    registry: &BlockTypeRegistry,
    block: &str,
    attributes: &Attributes,
) -> Result<()> {
    registry.validate(block, attributes)?;
    let markup = registry.render(block, attributes).await?;
    print!("{markup}");
    Ok(())
}

/// Print registered block types and their attribute schemas as JSON.
pub fn cmd_block_types(config: &Config) -> Result<()> {
    let registry = standard_registry(
        Arc::new(InMemoryPostStore::new()),
        Arc::new(LocaleService::new()),
        config.render_settings(),
    );

    let json = serde_json::to_string_pretty(&registry.definitions())
        .context("failed to serialize block types")?;
    println!("{json}");
    Ok(())
}

/// Apply the bundled database migrations.
pub async fn cmd_migrate(config: &Config) -> Result<()> {
    let Some(url) = &config.database_url else {
        bail!("DATABASE_URL is required to run migrations");
    };

    let pool = db::create_pool(url, config.database_max_connections).await?;
    PgPostStore::new(pool, &config.site_url)
        .migrate()
        .await
        .context("failed to run migrations")?;

    println!("Migrations applied.");
    Ok(())
}
