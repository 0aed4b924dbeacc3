//! `epgedit doctor`: Diagnose config and data paths.

use epgedit_config::AppConfig;
use epgedit_core::ScheduleStore;
use epgedit_rules::RuleSet;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 epgedit Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file, using defaults — run `epgedit init`");
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

    let storage = &config.storage;
    if storage.backend == "memory" {
        println!("  ⚠️  Memory backend: schedule changes are lost on restart");
    }

    if storage.data_dir.exists() {
        println!("  ✅ Data directory: {}", storage.data_dir.display());
    } else {
        println!("  ❌ Data directory missing: {}", storage.data_dir.display());
        issues += 1;
    }

    let store = epgedit_store::from_config(storage);
    match store.load_document().await {
        Ok(doc) => println!(
            "  ✅ Schedule: {} channel(s), {} program(s)",
            doc.channels.len(),
            doc.programs.len()
        ),
        Err(e) => {
            println!("  ❌ Schedule: {e}");
            issues += 1;
        }
    }

    match store.load_rule_sources().await {
        Ok(sources) => match RuleSet::from_sources(&sources) {
            Ok(rules) => println!(
                "  ✅ Rules: {} placement, {} neighbour",
                rules.placement_rules().len(),
                rules.neighbour_rules().len()
            ),
            Err(e) => {
                println!("  ❌ Rules: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Rules: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
