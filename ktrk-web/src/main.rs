//! ktrk-web - Tracker dashboard service
//!
//! Serves the tracker HTTP API over the embedded SQLite database:
//! record CRUD with audit, tab snapshots, refresh, saved views,
//! comments/discussions, and the summary report.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ktrk_common::config::{database_path, resolve_root_folder, TrackerConfig};
use ktrk_common::db::{init_database, sync_allowlist_from_config};
use ktrk_web::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "ktrk-web", about = "Tracker dashboard service")]
struct Cli {
    /// Root folder holding tracker.db and ktrk.toml
    #[arg(long, env = "KTRK_ROOT_FOLDER")]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any database delays
    info!(
        "Starting ktrk-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();
    let root_folder = resolve_root_folder(cli.root_folder.as_deref());
    info!("Root folder: {}", root_folder.display());

    let config = TrackerConfig::load(&root_folder)?;
    let db_path = database_path(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Database ready");

    sync_allowlist_from_config(&pool, &config.allowlist_ids).await?;
    if config.allowlist_enabled {
        info!("Access list enforcement enabled");
    }

    let port = config.port;
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("ktrk-web listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
