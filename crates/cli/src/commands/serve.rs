//! `edupilot serve`: Start the HTTP gateway.

use edupilot_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🎓 EduPilot Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.active_model());
    println!("   Store:     {}", config.store.backend);

    edupilot_gateway::start(config).await?;

    Ok(())
}
