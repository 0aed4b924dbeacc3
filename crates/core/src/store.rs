//! Storage collaborator trait.
//!
//! The core never touches storage itself. The service layer fetches the
//! schedule and rule sources through a [`ScheduleStore`] before calling into
//! the core, and persists results after.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::StoreError;
use crate::program::ScheduleDocument;

/// Raw rule documents as authored by the schedule editors.
///
/// Kept as JSON so the rules crate owns their interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSources {
    pub placement: serde_json::Value,
    pub neighbour: serde_json::Value,
}

/// Where the authoritative schedule and its rule sets live.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Fetch the current authoritative schedule.
    async fn load_document(&self) -> Result<ScheduleDocument, StoreError>;

    /// Replace the authoritative schedule.
    async fn save_document(&self, document: &ScheduleDocument) -> Result<(), StoreError>;

    /// Fetch both rule documents.
    async fn load_rule_sources(&self) -> Result<RuleSources, StoreError>;

    /// Copy the current schedule to the next numbered version.
    /// Returns the key of the backup.
    async fn create_backup(&self, today: NaiveDate) -> Result<String, StoreError>;

    /// Keep a timestamped copy of a committed schedule. Returns its key.
    async fn archive(
        &self,
        document: &ScheduleDocument,
        at: NaiveDateTime,
    ) -> Result<String, StoreError>;

    /// Park a schedule that failed validation so the editor can resume it.
    async fn save_draft(&self, document: &ScheduleDocument) -> Result<(), StoreError>;
}
