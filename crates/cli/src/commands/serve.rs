//! `epgedit serve`: Start the HTTP API server.

use epgedit_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📺 epgedit Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Storage:   {} ({})", config.storage.backend, config.storage.data_dir.display());

    epgedit_gateway::start(config).await?;

    Ok(())
}
