//! `epgedit rebuild`: Apply an edit submission to a schedule document.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};
use epgedit_config::AppConfig;
use epgedit_schedule::{RebuildOptions, apply_request, parse_document, parse_request, render_document};

pub async fn run(
    document: &Path,
    request: &Path,
    date: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let offset = config.schedule.generation_offset();

    let doc_text = std::fs::read_to_string(document)
        .map_err(|e| format!("Failed to read {}: {e}", document.display()))?;
    let req_text = std::fs::read_to_string(request)
        .map_err(|e| format!("Failed to read {}: {e}", request.display()))?;

    let options = match date {
        Some(day) => RebuildOptions::new(
            day.and_time(NaiveTime::MIN),
            Utc::now().with_timezone(&offset),
        ),
        None => RebuildOptions::now(offset),
    };

    let rebuilt = apply_request(&parse_document(&doc_text)?, &parse_request(&req_text)?, &options)?;
    let xml = render_document(&rebuilt)?;

    match output {
        Some(path) => {
            std::fs::write(path, &xml)?;
            eprintln!(
                "✅ Rebuilt schedule written to {} ({} programs)",
                path.display(),
                rebuilt.programs.len()
            );
        }
        None => println!("{xml}"),
    }

    Ok(())
}
