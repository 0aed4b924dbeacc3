//! Program catalog index: `(channel, program id)` lookup over a document.

use std::collections::HashMap;

use epgedit_core::{ProgramEntry, ScheduleDocument};
use tracing::debug;

/// Read-only lookup from `(channel id, program id)` to the entry that
/// serves as the template for a rebuilt program.
///
/// When a program id appears more than once on a channel, the last
/// occurrence wins.
#[derive(Debug, Default)]
pub struct ProgramCatalogIndex<'a> {
    channels: HashMap<&'a str, HashMap<&'a str, &'a ProgramEntry>>,
    len: usize,
}

impl<'a> ProgramCatalogIndex<'a> {
    pub fn build(document: &'a ScheduleDocument) -> Self {
        let mut channels: HashMap<&'a str, HashMap<&'a str, &'a ProgramEntry>> = HashMap::new();
        let mut len = 0;

        for entry in &document.programs {
            let programs = channels.entry(entry.channel_id.as_str()).or_default();
            if programs.insert(entry.program_id.as_str(), entry).is_some() {
                debug!(
                    channel = %entry.channel_id,
                    program = %entry.program_id,
                    "Duplicate catalog entry, keeping the later one"
                );
            } else {
                len += 1;
            }
        }

        Self { channels, len }
    }

    pub fn lookup(&self, channel_id: &str, program_id: &str) -> Option<&'a ProgramEntry> {
        self.channels
            .get(channel_id)
            .and_then(|programs| programs.get(program_id))
            .copied()
    }

    /// Number of distinct `(channel, program)` pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
