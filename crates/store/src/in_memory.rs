//! In-memory store: useful for testing and ephemeral sessions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use epgedit_core::{RuleSources, ScheduleDocument, ScheduleStore, StoreError};
use tokio::sync::RwLock;

const DOCUMENT_KEY: &str = "xmltv.xml";

#[derive(Debug, Default)]
struct State {
    document: Option<ScheduleDocument>,
    rules: RuleSources,
    backups: Vec<(String, ScheduleDocument)>,
    archives: Vec<(String, ScheduleDocument)>,
    draft: Option<ScheduleDocument>,
}

/// A [`ScheduleStore`] that keeps everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: ScheduleDocument) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                document: Some(document),
                ..State::default()
            })),
        }
    }

    /// Replace the rule documents.
    pub async fn set_rules(&self, rules: RuleSources) {
        self.state.write().await.rules = rules;
    }

    /// Backup keys in creation order.
    pub async fn backups(&self) -> Vec<String> {
        self.state.read().await.backups.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Archived documents in creation order.
    pub async fn archives(&self) -> Vec<(String, ScheduleDocument)> {
        self.state.read().await.archives.clone()
    }

    pub async fn draft(&self) -> Option<ScheduleDocument> {
        self.state.read().await.draft.clone()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_document(&self) -> Result<ScheduleDocument, StoreError> {
        self.state
            .read()
            .await
            .document
            .clone()
            .ok_or_else(|| StoreError::NotFound(DOCUMENT_KEY.into()))
    }

    async fn save_document(&self, document: &ScheduleDocument) -> Result<(), StoreError> {
        self.state.write().await.document = Some(document.clone());
        Ok(())
    }

    async fn load_rule_sources(&self) -> Result<RuleSources, StoreError> {
        Ok(self.state.read().await.rules.clone())
    }

    async fn create_backup(&self, today: NaiveDate) -> Result<String, StoreError> {
        let mut state = self.state.write().await;
        let document = state
            .document
            .clone()
            .ok_or_else(|| StoreError::NotFound(DOCUMENT_KEY.into()))?;
        let key = format!(
            "xmltv_v{}_{}.xml",
            state.backups.len() + 1,
            today.format("%m-%d-%Y")
        );
        state.backups.push((key.clone(), document));
        Ok(key)
    }

    async fn archive(
        &self,
        document: &ScheduleDocument,
        at: NaiveDateTime,
    ) -> Result<String, StoreError> {
        let key = format!("archive/xmltv-edited-{}.xml", at.format("%Y%m%d%H%M%S"));
        self.state
            .write()
            .await
            .archives
            .push((key.clone(), document.clone()));
        Ok(key)
    }

    async fn save_draft(&self, document: &ScheduleDocument) -> Result<(), StoreError> {
        self.state.write().await.draft = Some(document.clone());
        Ok(())
    }
}
