//! Schedule rebuilder.
//!
//! Given the edited order of one channel's programs, lay them end to end
//! from the day's origin, then merge them back with every other channel's
//! untouched programs.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, NaiveTime, Utc};
use epgedit_core::{
    Channel, EditedItem, Error, ProgramEntry, Result, ScheduleDocument, ScheduleRequest,
};
use tracing::{debug, info, warn};

use crate::catalog::ProgramCatalogIndex;

/// Clock inputs to a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOptions {
    /// Start of the first rebuilt program.
    pub origin: NaiveDateTime,
    /// Instant recorded as the document's generation time.
    pub generated_at: DateTime<FixedOffset>,
}

impl RebuildOptions {
    pub fn new(origin: NaiveDateTime, generated_at: DateTime<FixedOffset>) -> Self {
        Self {
            origin,
            generated_at,
        }
    }

    /// Today's local midnight, stamped with the current time in `offset`.
    pub fn now(offset: FixedOffset) -> Self {
        Self {
            origin: Local::now().date_naive().and_time(NaiveTime::MIN),
            generated_at: Utc::now().with_timezone(&offset),
        }
    }
}

/// Render a generation instant as `YYYYMMDDHHMMSS +HHMM`.
pub fn generation_stamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y%m%d%H%M%S %z").to_string()
}

/// Rebuild `channel_id` from `edited`, keeping every other channel as is.
///
/// Fails without producing anything when an edited program is missing from
/// the catalog, would end up with negative filler, or would run past the
/// representable time range.
pub fn rebuild(
    document: &ScheduleDocument,
    channel_id: &str,
    edited: &[EditedItem],
    options: &RebuildOptions,
) -> Result<ScheduleDocument> {
    let catalog = ProgramCatalogIndex::build(document);
    debug!(channel = channel_id, catalog = catalog.len(), "Catalog indexed");

    let mut cursor = options.origin;
    let mut rebuilt = Vec::with_capacity(edited.len());

    for item in edited {
        if item.channel_id != channel_id {
            warn!(
                channel = channel_id,
                item_channel = %item.channel_id,
                program = %item.program_id,
                "Edited item belongs to another channel"
            );
        }

        let template = catalog
            .lookup(&item.channel_id, &item.program_id)
            .ok_or_else(|| Error::ProgramNotFound {
                channel_id: item.channel_id.clone(),
                program_id: item.program_id.clone(),
            })?;

        let filler = template
            .filler_minutes
            .checked_add(item.additional_filler_minutes)
            .ok_or_else(|| out_of_range(item))?;
        if filler < 0 {
            return Err(Error::NegativeFiller {
                channel_id: item.channel_id.clone(),
                program_id: item.program_id.clone(),
                minutes: filler,
            });
        }
        if template.duration_minutes < 0 {
            return Err(Error::malformed(format!(
                "program {} on channel {} has negative duration {}",
                item.program_id, item.channel_id, template.duration_minutes
            )));
        }

        let start = cursor;
        let stop = template
            .duration_minutes
            .checked_add(filler)
            .and_then(Duration::try_minutes)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(|| out_of_range(item))?;
        rebuilt.push(ProgramEntry {
            channel_id: template.channel_id.clone(),
            program_id: item.program_id.clone(),
            filler_minutes: filler,
            start,
            stop,
            slot: None,
            ..template.clone()
        });
        cursor = stop;
    }

    let rebuilt_count = rebuilt.len();
    let mut programs: Vec<ProgramEntry> = document
        .programs
        .iter()
        .filter(|p| p.channel_id != channel_id)
        .cloned()
        .chain(rebuilt)
        .collect();
    // Stable: each channel keeps its own order.
    programs.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));

    info!(
        channel = channel_id,
        rebuilt = rebuilt_count,
        total = programs.len(),
        "Schedule rebuilt"
    );

    Ok(ScheduleDocument {
        attributes: document.attributes.clone(),
        date: Some(generation_stamp(&options.generated_at)),
        channels: distinct_channels(&document.channels),
        programs,
    })
}

/// Rebuild the channel named by an edit submission.
pub fn apply_request(
    document: &ScheduleDocument,
    request: &ScheduleRequest,
    options: &RebuildOptions,
) -> Result<ScheduleDocument> {
    rebuild(document, &request.channel_id, &request.programs, options)
}

fn out_of_range(item: &EditedItem) -> Error {
    Error::malformed(format!(
        "program {} on channel {} would end outside the representable time range",
        item.program_id, item.channel_id
    ))
}

fn distinct_channels(channels: &[Channel]) -> Vec<Channel> {
    let mut seen: Vec<Channel> = Vec::with_capacity(channels.len());
    for channel in channels {
        if !seen.iter().any(|c| c.id == channel.id) {
            seen.push(channel.clone());
        }
    }
    seen
}
