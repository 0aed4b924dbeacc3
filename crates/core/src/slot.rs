//! Broadcast day-parts ("time slots").
//!
//! A slot is named by where it starts; it runs until the next slot begins.
//! Placement rules permit or forbid entries per slot name.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A named day-part beginning at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub name: String,
    #[serde(with = "clock")]
    pub start: NaiveTime,
}

impl TimeSlot {
    pub fn new(name: impl Into<String>, hour: u32, minute: u32) -> Self {
        Self {
            name: name.into(),
            start: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Ordered set of day-parts covering a broadcast day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotTable {
    slots: Vec<TimeSlot>,
}

impl TimeSlotTable {
    pub fn new(mut slots: Vec<TimeSlot>) -> Self {
        slots.sort_by_key(|s| s.start);
        Self { slots }
    }

    /// The slot a clock time falls into, or `None` before the first slot.
    pub fn classify(&self, at: NaiveTime) -> Option<&str> {
        self.slots
            .iter()
            .rev()
            .find(|s| s.start <= at)
            .map(|s| s.name.as_str())
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name == name)
    }
}

impl Default for TimeSlotTable {
    fn default() -> Self {
        Self::new(default_slots())
    }
}

/// The editorial day-parts used by the schedule editor.
pub fn default_slots() -> Vec<TimeSlot> {
    vec![
        TimeSlot::new("Mid Night", 0, 0),
        TimeSlot::new("Early Morning", 4, 0),
        TimeSlot::new("Morning Time", 7, 30),
        TimeSlot::new("Late Morning", 10, 30),
        TimeSlot::new("Afternoon Time", 12, 0),
        TimeSlot::new("Evening Time", 16, 30),
        TimeSlot::new("Prime Time", 19, 0),
        TimeSlot::new("Late Night", 22, 0),
    ]
}

/// `HH:MM` clock times.
mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid clock time '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn classifies_boundaries_half_open() {
        let table = TimeSlotTable::default();
        assert_eq!(table.classify(hm(0, 0)), Some("Mid Night"));
        assert_eq!(table.classify(hm(7, 29)), Some("Early Morning"));
        assert_eq!(table.classify(hm(7, 30)), Some("Morning Time"));
        assert_eq!(table.classify(hm(19, 0)), Some("Prime Time"));
        assert_eq!(table.classify(hm(23, 59)), Some("Late Night"));
    }

    #[test]
    fn time_before_first_slot_is_unclassified() {
        let table = TimeSlotTable::new(vec![TimeSlot::new("Day", 6, 0)]);
        assert_eq!(table.classify(hm(5, 0)), None);
        assert_eq!(table.classify(hm(6, 0)), Some("Day"));
    }

    #[test]
    fn slots_are_sorted_on_construction() {
        let table = TimeSlotTable::new(vec![TimeSlot::new("Late", 20, 0), TimeSlot::new("Early", 1, 0)]);
        assert_eq!(table.slots()[0].name, "Early");
        assert!(table.contains("Late"));
    }

    #[test]
    fn slot_deserializes_from_clock_string() {
        let slot: TimeSlot =
            serde_json::from_value(serde_json::json!({"name": "Prime Time", "start": "19:00"})).unwrap();
        assert_eq!(slot, TimeSlot::new("Prime Time", 19, 0));
    }
}
