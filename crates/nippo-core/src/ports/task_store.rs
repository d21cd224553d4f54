//! TaskStore port - 日付ごとのタスク一覧の正本（source of truth）
//!
//! TaskStore は「ある日付のタスク一覧」を丸ごと読み書きするだけの薄い抽象です。
//! 「今日」の解決や排他制御はスケジューラ側の責務で、ストアには
//! 常に具体的な日付が渡されます。
//!
//! # 実装
//! - **InMemoryTaskStore**: テスト用（impls::inmem_store）
//! - **JsonFileTaskStore**: 日付ごとの JSON ファイル（impls::json_store）

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::task::TaskRecord;

/// StoreError は永続化層のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Other(String),
}

/// TaskStore は日付ごとのタスク一覧を保存
///
/// # 設計原則
/// - まだ書かれていない日付の `load_schedule` は空のリスト（エラーではない）
/// - `save_schedule` は一覧を丸ごと置き換える
/// - 失敗はそのまま返す（リトライは呼び出し側の判断）
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 日付のタスク一覧を読む（順序は保存時のまま）
    async fn load_schedule(&self, date: NaiveDate) -> Result<Vec<TaskRecord>, StoreError>;

    /// 日付のタスク一覧を書く
    async fn save_schedule(&self, date: NaiveDate, tasks: &[TaskRecord]) -> Result<(), StoreError>;

    /// その日付のストアが存在するか
    async fn schedule_exists(&self, date: NaiveDate) -> Result<bool, StoreError>;

    /// 日付のストアごと削除する。存在しなければ `false`
    async fn delete_schedule(&self, date: NaiveDate) -> Result<bool, StoreError>;

    /// 保存済みの日付一覧（順不同）
    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError>;
}
