//! `epgedit init`: First-time setup.

use epgedit_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📺 epgedit — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let storage = &config.storage;

    for dir in [storage.data_dir.clone(), storage.archive_path()] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            println!("✅ Created {}", dir.display());
        }
    }

    // Empty rule sets validate everything; editors fill them in.
    for path in [storage.placement_rules_path(), storage.neighbour_rules_path()] {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, "[]\n")?;
            println!("✅ Created {}", path.display());
        }
    }

    println!("\n📝 Next steps:");
    println!("   1. Put the schedule at {}", storage.document_path().display());
    println!("   2. Add rules, then run `epgedit rules check`");
    println!("   3. Start the service with `epgedit serve`");

    Ok(())
}
