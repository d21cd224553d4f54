//! DateLocks - 日付ごとの非同期ロック
//!
//! 同じ日付への変更操作（load → 変更 → save）を直列化します。
//! 別の日付同士は互いに待ちません。

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 日付 → ロックの表
///
/// 表自体は短時間しか触らないので std の Mutex、日付ごとのロックは
/// await をまたいで保持するので tokio の Mutex を使います。
#[derive(Default)]
pub struct DateLocks {
    locks: StdMutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// `date` のロックを取得（解放は guard の drop）
    pub async fn lock(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(date).or_default())
        };
        lock.lock_owned().await
    }
}
