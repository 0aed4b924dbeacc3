//! `epgedit rules`: Inspect the configured rule set.

use epgedit_config::AppConfig;
use epgedit_core::ScheduleStore;
use epgedit_rules::{NeighbourOutcome, RuleSet};

async fn load() -> Result<(AppConfig, RuleSet), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let sources = epgedit_store::from_config(&config.storage)
        .load_rule_sources()
        .await?;
    let rules = RuleSet::from_sources(&sources)?;
    Ok((config, rules))
}

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (_, rules) = load().await?;

    println!("Placement rules (evaluation order):");
    if rules.placement_rules().is_empty() {
        println!("  (none)");
    }
    for rule in rules.placement_rules() {
        println!(
            "  [{:>3}] #{:<5} {:<30} → {}",
            rule.precedence,
            rule.id,
            rule.title,
            rule.permitted_slots.join(", ")
        );
    }

    println!("\nNeighbour rules:");
    if rules.neighbour_rules().is_empty() {
        println!("  (none)");
    }
    for rule in rules.neighbour_rules() {
        let marker = match rule.outcome {
            NeighbourOutcome::Invalid => "invalid",
            NeighbourOutcome::Informational => "info",
        };
        println!("  #{:<5} {:<30} ({marker})", rule.id, rule.title);
    }

    if rules.disabled_count() > 0 {
        println!("\n{} placement rule(s) disabled (precedence 0)", rules.disabled_count());
    }

    Ok(())
}

pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Checking rule files...");

    match load().await {
        Ok((config, rules)) => {
            println!("   ✅ {}", config.storage.placement_rules_path().display());
            println!("   ✅ {}", config.storage.neighbour_rules_path().display());
            println!(
                "   {} placement, {} neighbour, {} disabled",
                rules.placement_rules().len(),
                rules.neighbour_rules().len(),
                rules.disabled_count()
            );
            if rules.is_empty() {
                println!("   ⚠️  Rule set is empty; every schedule will validate");
            }
            Ok(())
        }
        Err(e) => {
            println!("   ❌ {e}");
            Err(e)
        }
    }
}
