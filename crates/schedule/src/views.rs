//! Derived documents: the per-day view and the draft of a rejected edit.

use chrono::NaiveDate;
use epgedit_core::{ProgramEntry, ScheduleDocument};

/// Keep every channel but only the programs starting on `date`.
pub fn filter_by_date(document: &ScheduleDocument, date: NaiveDate) -> ScheduleDocument {
    ScheduleDocument {
        attributes: document.attributes.clone(),
        date: document.date.clone(),
        channels: document.channels.clone(),
        programs: document
            .programs
            .iter()
            .filter(|p| p.start.date() == date)
            .cloned()
            .collect(),
    }
}

/// A bare document holding a submitted sequence as-is, so an editor can
/// resume work on a schedule that failed validation.
pub fn draft_document(entries: &[ProgramEntry]) -> ScheduleDocument {
    ScheduleDocument {
        programs: entries
            .iter()
            .cloned()
            .map(|mut entry| {
                entry.slot = None;
                entry
            })
            .collect(),
        ..Default::default()
    }
}
