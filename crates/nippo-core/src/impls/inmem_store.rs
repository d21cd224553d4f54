//! In-memory task store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::domain::task::TaskRecord;
use crate::ports::task_store::{StoreError, TaskStore};

/// InMemoryTaskStore は開発・テスト用の TaskStore
///
/// Clone すると同じ中身を共有します。`fail_saves(true)` で以降の保存を
/// 失敗させられるので、エラー伝播のテストに使えます。
#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    schedules: Mutex<HashMap<NaiveDate, Vec<TaskRecord>>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// これまでに成功した保存の回数
    pub fn save_count(&self) -> usize {
        self.inner.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn load_schedule(&self, date: NaiveDate) -> Result<Vec<TaskRecord>, StoreError> {
        let schedules = self.inner.schedules.lock().await;
        Ok(schedules.get(&date).cloned().unwrap_or_default())
    }

    async fn save_schedule(&self, date: NaiveDate, tasks: &[TaskRecord]) -> Result<(), StoreError> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Other(format!("save rejected for {date}")));
        }
        let mut schedules = self.inner.schedules.lock().await;
        schedules.insert(date, tasks.to_vec());
        self.inner.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn schedule_exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.inner.schedules.lock().await.contains_key(&date))
    }

    async fn delete_schedule(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.inner.schedules.lock().await.remove(&date).is_some())
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self.inner.schedules.lock().await.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::TaskId;
    use chrono::{TimeZone, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[tokio::test]
    async fn missing_date_loads_as_empty() {
        let store = InMemoryTaskStore::new();
        assert!(store.load_schedule(date()).await.unwrap().is_empty());
        assert!(!store.schedule_exists(date()).await.unwrap());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = InMemoryTaskStore::new();
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
        let task = TaskRecord::started(TaskId::from("task-1"), "Design", None, "午前 9:00", date(), now);

        store.save_schedule(date(), &[task.clone()]).await.unwrap();

        assert_eq!(store.load_schedule(date()).await.unwrap(), vec![task]);
        assert!(store.schedule_exists(date()).await.unwrap());
        assert_eq!(store.list_dates().await.unwrap(), vec![date()]);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_date() {
        let store = InMemoryTaskStore::new();
        store.save_schedule(date(), &[]).await.unwrap();

        assert!(store.delete_schedule(date()).await.unwrap());
        assert!(!store.delete_schedule(date()).await.unwrap());
        assert!(store.list_dates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_saves_leave_data_untouched() {
        let store = InMemoryTaskStore::new();
        store.fail_saves(true);

        let err = store.save_schedule(date(), &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
        assert!(!store.schedule_exists(date()).await.unwrap());
        assert_eq!(store.save_count(), 0);
    }
}
