// src/main.rs
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use atelier_kpi::api::{self, AppState};
use atelier_kpi::config::AppConfig;
use atelier_kpi::store::Store;

#[derive(Debug, Parser)]
#[command(name = "atelier-kpi", about = "Workshop KPI backend")]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0:8000")]
    addr: SocketAddr,
    /// SQLite database file (overrides DATABASE_PATH).
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(database) = args.database {
        config.database_path = database;
    }
    info!(
        "Configuration loaded (env={}, database={})",
        config.env_name,
        config.database_path.display()
    );

    let store = Store::new(config.database_path.clone());
    store
        .ensure_schema()
        .context("Initialising database schema failed")?;

    let state = AppState::new(config, store);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Binding {} failed", args.addr))?;
    info!("Starting server on http://{}", args.addr);
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;
    Ok(())
}
