use agri_nourish::{config::Config, create_advisor, http::start_http_server, init_tracing};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config.runtime.log_level);

    info!("Starting Agri-Nourish advisor service");
    info!(
        "Configuration loaded: bind={}, advisor={}, max_image_bytes={}",
        config.server.bind, config.advisor.provider, config.server.max_image_bytes
    );

    let advisor = create_advisor(&config)?;
    start_http_server(config, advisor).await?;

    Ok(())
}
