//! `epgedit validate`: Check an edited schedule against the rule set.

use std::path::{Path, PathBuf};

use epgedit_config::AppConfig;
use epgedit_core::{ProgramEntry, RuleSources, ScheduleStore};
use epgedit_rules::{RuleEngine, RuleSet};
use serde_json::Value;

/// Accepts the gateway payload or a bare array of entries.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped { schedule: Vec<ProgramEntry> },
    Bare(Vec<ProgramEntry>),
}

pub(crate) fn parse_entries(text: &str) -> Result<Vec<ProgramEntry>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        Payload::Wrapped { schedule } => schedule,
        Payload::Bare(entries) => entries,
    })
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)
        .map_err(|e| format!("{} is not valid JSON: {e}", path.display()))?)
}

/// Configured rule sources with any file overrides applied.
pub(crate) async fn rule_sources(
    config: &AppConfig,
    placement: Option<PathBuf>,
    neighbour: Option<PathBuf>,
) -> Result<RuleSources, Box<dyn std::error::Error>> {
    let mut sources = if placement.is_some() && neighbour.is_some() {
        RuleSources::default()
    } else {
        epgedit_store::from_config(&config.storage)
            .load_rule_sources()
            .await?
    };
    if let Some(path) = placement {
        sources.placement = read_json(&path)?;
    }
    if let Some(path) = neighbour {
        sources.neighbour = read_json(&path)?;
    }
    Ok(sources)
}

/// Prints the verdict as JSON and returns whether the schedule is valid.
pub async fn run(
    schedule: &Path,
    placement: Option<PathBuf>,
    neighbour: Option<PathBuf>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let text = std::fs::read_to_string(schedule)
        .map_err(|e| format!("Failed to read {}: {e}", schedule.display()))?;
    let entries = parse_entries(&text)?;

    let sources = rule_sources(&config, placement, neighbour).await?;
    let engine = RuleEngine::new(RuleSet::from_sources(&sources)?)
        .with_slots(config.schedule.slot_table());

    let verdict = engine.validate(&entries);
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(verdict.valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_wrapped_and_bare_payloads() {
        let entry = r#"{"movieId": "P1", "channelId": "C1", "duration": "30",
                        "start": "20240301190000", "stop": "20240301193000"}"#;
        let wrapped = parse_entries(&format!(r#"{{"schedule": [{entry}]}}"#)).unwrap();
        let bare = parse_entries(&format!("[{entry}]")).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped[0].duration_minutes, 30);
    }

    #[test]
    fn rejects_non_schedule_json() {
        assert!(parse_entries(r#"{"items": []}"#).is_err());
    }

    #[tokio::test]
    async fn explicit_rule_files_skip_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let placement = dir.path().join("placement.json");
        let neighbour = dir.path().join("neighbour.json");
        std::fs::write(&placement, "[]").unwrap();
        std::fs::write(&neighbour, "[]").unwrap();

        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().join("missing");
        let sources = rule_sources(&config, Some(placement), Some(neighbour))
            .await
            .unwrap();
        assert_eq!(sources.placement, serde_json::json!([]));
        assert_eq!(sources.neighbour, serde_json::json!([]));
    }
}
