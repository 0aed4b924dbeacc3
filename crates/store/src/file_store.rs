//! File-system schedule store.
//!
//! Layout under the data directory (all names configurable):
//!
//! ```text
//! data/
//! ├── xmltv.xml                      authoritative schedule
//! ├── xmltv_v3_03-01-2024.xml        session backups
//! ├── edited_inprogress.xml          draft of the last rejected edit
//! ├── rules/
//! │   ├── placement_rules.json
//! │   └── neighbour_rules.json
//! └── archive/
//!     └── xmltv-edited-20240301120000.xml
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use epgedit_config::StorageConfig;
use epgedit_core::{RuleSources, ScheduleDocument, ScheduleStore, StoreError};
use epgedit_schedule::{parse_document, render_document};
use tracing::{debug, info, warn};

const COLLABORATOR: &str = "file store";

/// A [`ScheduleStore`] over plain files.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a half-written schedule.
#[derive(Debug, Clone)]
pub struct FileStore {
    document: PathBuf,
    placement_rules: PathBuf,
    neighbour_rules: PathBuf,
    archive_dir: PathBuf,
    draft: PathBuf,
}

impl FileStore {
    /// A store using the default file names under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let storage = StorageConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..StorageConfig::default()
        };
        Self::from_config(&storage)
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self {
            document: storage.document_path(),
            placement_rules: storage.placement_rules_path(),
            neighbour_rules: storage.neighbour_rules_path(),
            archive_dir: storage.archive_path(),
            draft: storage.draft_path(),
        }
    }

    pub fn document_path(&self) -> &Path {
        &self.document
    }

    pub fn draft_path(&self) -> &Path {
        &self.draft
    }

    fn stem(&self) -> String {
        self.document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "schedule".into())
    }

    fn backup_dir(&self) -> PathBuf {
        self.document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    async fn write_document(&self, path: &Path, document: &ScheduleDocument) -> Result<(), StoreError> {
        let xml = render_document(document).map_err(|e| StoreError::Corrupt {
            key: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(path, xml.as_bytes()).await
    }

    /// Highest existing backup version of the document.
    async fn latest_backup_version(&self) -> Result<u32, StoreError> {
        let dir = self.backup_dir();
        let prefix = format!("{}_v", self.stem());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::unavailable(COLLABORATOR, e)),
        };

        let mut latest = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::unavailable(COLLABORATOR, e))?
        {
            let name = entry.file_name();
            if let Some(version) = backup_version(&name.to_string_lossy(), &prefix) {
                latest = latest.max(version);
            }
        }
        Ok(latest)
    }
}

/// Parse `n` out of `{stem}_v{n}_{date}.xml`.
fn backup_version(file_name: &str, prefix: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(prefix)?;
    let (version, _) = rest.split_once('_')?;
    version.parse().ok()
}

async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::unavailable(COLLABORATOR, format!("{}: {e}", path.display()))),
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StoreError::unavailable(COLLABORATOR, format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await.map_err(|e| {
        StoreError::unavailable(COLLABORATOR, format!("failed to write {}: {e}", tmp.display()))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        StoreError::unavailable(COLLABORATOR, format!("failed to replace {}: {e}", path.display()))
    })
}

async fn read_rules(path: &Path) -> Result<serde_json::Value, StoreError> {
    let Some(content) = read_optional(path).await? else {
        warn!(path = %path.display(), "Rule file not found, treating as empty");
        return Ok(serde_json::Value::Null);
    };
    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
        key: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ScheduleStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_document(&self) -> Result<ScheduleDocument, StoreError> {
        let key = self.document.display().to_string();
        let xml = read_optional(&self.document)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let document = parse_document(&xml).map_err(|e| StoreError::Corrupt {
            key,
            reason: e.to_string(),
        })?;
        debug!(
            path = %self.document.display(),
            programs = document.programs.len(),
            "Schedule loaded"
        );
        Ok(document)
    }

    async fn save_document(&self, document: &ScheduleDocument) -> Result<(), StoreError> {
        self.write_document(&self.document, document).await?;
        info!(path = %self.document.display(), programs = document.programs.len(), "Schedule saved");
        Ok(())
    }

    async fn load_rule_sources(&self) -> Result<RuleSources, StoreError> {
        Ok(RuleSources {
            placement: read_rules(&self.placement_rules).await?,
            neighbour: read_rules(&self.neighbour_rules).await?,
        })
    }

    async fn create_backup(&self, today: NaiveDate) -> Result<String, StoreError> {
        let version = self.latest_backup_version().await? + 1;
        let name = format!("{}_v{version}_{}.xml", self.stem(), today.format("%m-%d-%Y"));
        let target = self.backup_dir().join(&name);

        match tokio::fs::copy(&self.document, &target).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.document.display().to_string()));
            }
            Err(e) => return Err(StoreError::unavailable(COLLABORATOR, e)),
        }

        info!(backup = %target.display(), version, "Schedule backup created");
        Ok(target.display().to_string())
    }

    async fn archive(
        &self,
        document: &ScheduleDocument,
        at: NaiveDateTime,
    ) -> Result<String, StoreError> {
        let name = format!("{}-edited-{}.xml", self.stem(), at.format("%Y%m%d%H%M%S"));
        let target = self.archive_dir.join(name);
        self.write_document(&target, document).await?;
        info!(archive = %target.display(), "Schedule archived");
        Ok(target.display().to_string())
    }

    async fn save_draft(&self, document: &ScheduleDocument) -> Result<(), StoreError> {
        self.write_document(&self.draft, document).await?;
        info!(path = %self.draft.display(), "Draft schedule saved");
        Ok(())
    }
}
