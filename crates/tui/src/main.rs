mod app;
mod screens;
mod ui;

use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use trainers_log_core::{
    config::{self, AppConfig},
    RestStore, Route,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir()?)?;
    info!(path = %config_path.display(), "configuration loaded");

    let route = match std::env::args().nth(1) {
        Some(path) => Route::parse(&path)?,
        None => Route::Home,
    };

    let connection = config.connection()?;
    let store = RestStore::new(&connection)?;
    if config.actor_id.is_placeholder() {
        warn!("actor_id is not configured; writes are attributed to the placeholder identity");
    }

    let mut app = app::TrainersLogApp::new(store, config.actor_id, route);
    app.run().await
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("trainers-log.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI, so only the file receives events
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
