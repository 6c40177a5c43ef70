//! `edupilot doctor`: Diagnose system health.

use edupilot_config::AppConfig;
use edupilot_store::StoreClient;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 EduPilot Doctor: System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file, using defaults (run `edupilot onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    // Provider reachability
    if config.has_api_key() {
        println!("  ✅ API key configured");
        let router = edupilot_providers::router::build_from_config(&config);
        println!("  ℹ️  Registered providers: {}", router.list().join(", "));
        match router.default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ⚠️  Provider '{}' answered but reported unhealthy", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' check failed: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ No provider registered for '{}'", config.default_provider);
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  No API key configured (set GEMINI_API_KEY or add api_key to config.toml)");
        issues += 1;
    }

    // Profile store
    let client = StoreClient::new(config.store.clone());
    if client.is_enabled() {
        match client.handle().await {
            Ok(store) => match store.count().await {
                Ok(n) => println!("  ✅ Profile store '{}' open ({n} records)", store.name()),
                Err(e) => {
                    println!("  ❌ Profile store '{}' unreadable: {e}", store.name());
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Profile store failed to open: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ℹ️  Profile store disabled; chat uses inline contextData only");
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
