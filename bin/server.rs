// Camp Signups - Web Server

use anyhow::{Context, Result};
use camp_signups::api::{router, AppState};
use camp_signups::{logging, open_database, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init_logger(&config.log_filter);

    let conn = open_database(&config.database_url)?;
    info!(database = %config.database_url, "database opened");

    let app = router(AppState::new(conn));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
