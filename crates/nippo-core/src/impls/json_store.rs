//! JSON file task store: one history document per date.
//!
//! Layout:
//! ```text
//! <data_dir>/history/2025-03-14.json
//! ```
//! Each file holds `{ "date": "2025-03-14", "tasks": [...], "updatedAt": "..." }`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::task::{MISSING_TASK_DATE, TaskRecord};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::task_store::{StoreError, TaskStore};

const HISTORY_DIR: &str = "history";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// On-disk document for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDocument {
    #[serde(default = "missing_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

fn missing_date() -> NaiveDate {
    MISSING_TASK_DATE
}

/// JsonFileTaskStore は日付ごとの JSON ファイルに保存する TaskStore
///
/// 書き込みは一時ファイルに書いてから rename するので、途中で落ちても
/// 既存のファイルが半端な内容になることはありません。
pub struct JsonFileTaskStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl JsonFileTaskStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(data_dir, Arc::new(SystemClock))
    }

    /// `updatedAt` に使う時計を指定して作成
    pub fn with_clock(data_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: data_dir.into(),
            clock,
        }
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.history_dir()
            .join(format!("{}.json", date.format(DATE_FORMAT)))
    }

    async fn read_document(&self, path: &Path) -> Result<Option<ScheduleDocument>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TaskStore for JsonFileTaskStore {
    async fn load_schedule(&self, date: NaiveDate) -> Result<Vec<TaskRecord>, StoreError> {
        let path = self.path_for(date);
        let mut tasks = self
            .read_document(&path)
            .await?
            .map(|doc| doc.tasks)
            .unwrap_or_default();
        for task in &mut tasks {
            task.backfill_date(date);
        }
        debug!(%date, path = %path.display(), count = tasks.len(), "loaded schedule");
        Ok(tasks)
    }

    async fn save_schedule(&self, date: NaiveDate, tasks: &[TaskRecord]) -> Result<(), StoreError> {
        let dir = self.history_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let doc = ScheduleDocument {
            date,
            tasks: tasks.to_vec(),
            updated_at: self.clock.now(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;

        let path = self.path_for(date);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(%date, path = %path.display(), count = tasks.len(), "saved schedule");
        Ok(())
    }

    async fn schedule_exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.path_for(date)).await?)
    }

    async fn delete_schedule(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let path = self.path_for(date);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%date, path = %path.display(), "deleted schedule");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut entries = match tokio::fs::read_dir(self.history_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(date) = NaiveDate::parse_from_str(stem, DATE_FORMAT)
            {
                dates.push(date);
            }
        }
        Ok(dates)
    }
}
