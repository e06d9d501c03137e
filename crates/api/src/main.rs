use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use attendance_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::Config::load().context("Failed to load configuration")?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting attendance API v{}", env!("CARGO_PKG_VERSION"));

    let directory = services::load_directory(&config.geofence.directory_path)?;
    let attendance = Arc::new(app::build_attendance_service(&config, directory)?);

    let addr = config
        .socket_addr()
        .context("Invalid server.host / server.port")?;
    let app = app::create_app(config, attendance);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
