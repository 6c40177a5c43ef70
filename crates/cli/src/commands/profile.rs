//! `edupilot profile`: Profile record management.

use edupilot_assistant::ContextSnapshot;
use edupilot_config::AppConfig;
use edupilot_core::profile::ProfileStore;
use edupilot_store::StoreClient;
use std::path::Path;
use std::sync::Arc;

async fn open_store() -> Result<Arc<dyn ProfileStore>, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let client = StoreClient::new(config.store.clone());
    if !client.is_enabled() {
        return Err("Profile store is disabled (store.backend = \"none\")".into());
    }
    if config.store.backend == "memory" {
        eprintln!("  ⚠️  The memory backend does not persist between runs.");
    }
    Ok(client.handle().await?)
}

pub async fn show(user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store().await?;

    match store.fetch(user_id).await? {
        Some(record) => {
            println!("📇 Profile for {user_id} ({} backend)", store.name());
            println!();
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!();
            print!("{}", ContextSnapshot::build(&record).render());
        }
        None => {
            println!("No profile stored for {user_id}.");
            println!("Chat requests for this user will use placeholder context:");
            println!();
            print!("{}", ContextSnapshot::placeholder().render());
        }
    }

    Ok(())
}

pub async fn put(user_id: &str, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let record: serde_json::Value = serde_json::from_str(&content)?;
    if !record.is_object() {
        return Err("A profile record must be a JSON object".into());
    }

    let store = open_store().await?;
    store.put(user_id, record).await?;
    println!("✅ Stored profile for {user_id} ({} records total)", store.count().await?);

    Ok(())
}

pub async fn remove(user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store().await?;
    if store.remove(user_id).await? {
        println!("🗑️  Removed profile for {user_id}");
    } else {
        println!("No profile stored for {user_id}");
    }
    Ok(())
}
