//! # epgedit Core
//!
//! Domain types, traits, and error definitions for the epgedit schedule
//! editor. This crate has **no framework dependencies**. It defines the
//! model that the rules engine, the rebuilder and the service layer share.
//!
//! ## Design Philosophy
//!
//! The storage collaborator is a trait here; implementations live in
//! `epgedit-store`. Rule evaluation and schedule rebuilding are pure
//! functions over these types and never perform I/O.

pub mod error;
pub mod program;
pub mod slot;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, StoreError};
pub use program::{
    Channel, EditedItem, ProgramEntry, ScheduleDocument, ScheduleRequest, XMLTV_TIME_FORMAT,
    format_xmltv_time, parse_xmltv_time,
};
pub use slot::{TimeSlot, TimeSlotTable, default_slots};
pub use store::{RuleSources, ScheduleStore};
