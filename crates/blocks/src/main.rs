//! WDS block server.
//!
//! Serves block rendering over HTTP, or renders from the command line.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use wds_blocks::cli;
use wds_blocks::config::Config;
use wds_blocks::routes;
use wds_blocks::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve,

    /// Render a block and print the markup.
    Render {
        /// Block name, e.g. wds/recent-posts.
        block: String,

        /// Attributes as a JSON object.
        #[arg(long)]
        attributes: Option<String>,

        /// Read posts from a JSON fixture instead of the configured store.
        #[arg(long)]
        fixture: Option<PathBuf>,
    },

    /// List registered block types and their attribute schemas.
    BlockTypes,

    /// Apply database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Render {
            block,
            attributes,
            fixture,
        } => cli::cmd_render(&config, &block, attributes.as_deref(), fixture.as_deref()).await,
        Command::BlockTypes => cli::cmd_block_types(&config),
        Command::Migrate => cli::cmd_migrate(&config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!(port = config.port, "Starting WDS block server");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!(block_types = state.blocks().len(), "Block types registered");

    let app = routes::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
