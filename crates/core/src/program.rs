//! Schedule domain model: programs, channels, documents and edits.
//!
//! Field names on the wire follow the schedule editor's vocabulary
//! (`movieId`, `pc_rating`, `adSlateLength`, ...). Aliases accept the
//! snake_case spelling used by rule files and the CLI.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp layout used by XMLTV documents and the editor payloads.
pub const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parse an XMLTV timestamp. A trailing ` +HHMM` offset is ignored.
pub fn parse_xmltv_time(raw: &str) -> Result<NaiveDateTime> {
    let stamp = raw.split_whitespace().next().unwrap_or_default();
    NaiveDateTime::parse_from_str(stamp, XMLTV_TIME_FORMAT)
        .map_err(|e| Error::malformed(format!("invalid timestamp '{raw}': {e}")))
}

pub fn format_xmltv_time(at: &NaiveDateTime) -> String {
    at.format(XMLTV_TIME_FORMAT).to_string()
}

/// One scheduled broadcast item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEntry {
    #[serde(rename = "channelId", alias = "channel_id", alias = "channel")]
    pub channel_id: String,

    #[serde(rename = "movieId", alias = "program_id", alias = "id")]
    pub program_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "desc", alias = "description", default)]
    pub description: String,

    #[serde(rename = "genres", alias = "genre", default)]
    pub genre: String,

    #[serde(rename = "pc_rating", alias = "rating", default)]
    pub rating: String,

    /// Base content duration in minutes, filler excluded.
    #[serde(rename = "duration", default, deserialize_with = "minutes::deserialize")]
    pub duration_minutes: i64,

    /// Dead-air minutes appended after the content.
    #[serde(
        rename = "adSlateLength",
        alias = "ad_slate_length",
        alias = "filler",
        default,
        deserialize_with = "minutes::deserialize"
    )]
    pub filler_minutes: i64,

    #[serde(rename = "applied_rules", alias = "rule_annotation", default)]
    pub rule_annotation: String,

    #[serde(with = "xmltv_time")]
    pub start: NaiveDateTime,

    #[serde(with = "xmltv_time")]
    pub stop: NaiveDateTime,

    /// Slot category the editor placed this entry in. Derived from `start`
    /// when absent.
    #[serde(
        rename = "timeslot",
        alias = "slot",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub slot: Option<String>,
}

impl ProgramEntry {
    /// Whole minutes between start and stop, floored.
    pub fn scheduled_minutes(&self) -> i64 {
        (self.stop - self.start).num_seconds().div_euclid(60)
    }

    /// The explicitly assigned slot, ignoring blanks.
    pub fn assigned_slot(&self) -> Option<&str> {
        self.slot.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// A broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A full schedule: channel block plus program list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    /// Root attributes other than `date`, in document order.
    #[serde(default)]
    pub attributes: Vec<(String, String)>,

    /// Generation timestamp, kept as written (`YYYYMMDDHHMMSS +HHMM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default)]
    pub channels: Vec<Channel>,

    #[serde(default)]
    pub programs: Vec<ProgramEntry>,
}

impl ScheduleDocument {
    /// Programs belonging to one channel, in document order.
    pub fn programs_for<'a>(&'a self, channel_id: &'a str) -> impl Iterator<Item = &'a ProgramEntry> {
        self.programs.iter().filter(move |p| p.channel_id == channel_id)
    }

    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == channel_id)
    }

    /// Distinct channel ids across the channel block and the programs,
    /// first-seen order.
    pub fn channel_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        let all = self
            .channels
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.programs.iter().map(|p| p.channel_id.as_str()));
        for id in all {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Dates that have at least one program starting on them, ascending.
    pub fn broadcast_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.programs.iter().map(|p| p.start.date()).collect();
        dates.sort();
        dates.dedup();
        dates
    }
}

/// One row of an edited sequence submitted by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedItem {
    #[serde(rename = "movieId", alias = "program_id", alias = "id")]
    pub program_id: String,

    #[serde(rename = "channelId", alias = "channel_id")]
    pub channel_id: String,

    /// Minutes added to (or, when negative, removed from) the catalog filler.
    #[serde(
        rename = "additionalAdSlateLength",
        alias = "additional_ad_slate_length",
        alias = "additional_filler",
        default,
        deserialize_with = "minutes::deserialize"
    )]
    pub additional_filler_minutes: i64,
}

impl EditedItem {
    pub fn new(program_id: impl Into<String>, channel_id: impl Into<String>, extra: i64) -> Self {
        Self {
            program_id: program_id.into(),
            channel_id: channel_id.into(),
            additional_filler_minutes: extra,
        }
    }
}

/// An edit submission for exactly one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(rename = "xml_url", alias = "source_url", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(rename = "channel_id", alias = "channelId")]
    pub channel_id: String,

    #[serde(default)]
    pub programs: Vec<EditedItem>,
}

/// Serde adapter for XMLTV timestamps.
pub mod xmltv_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_xmltv_time(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_xmltv_time(&raw).map_err(serde::de::Error::custom)
    }
}

/// Minutes arrive as numbers or numeric strings from the editor.
mod minutes {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Int(n) => Ok(n),
            Raw::Float(f) => Ok(f.floor() as i64),
            Raw::Text(s) if s.trim().is_empty() => Ok(0),
            Raw::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| serde::de::Error::custom(format!("invalid minutes '{s}': {e}"))),
        }
    }
}
