//! Errors - スケジューラのエラー型と分類
//!
//! # 分類
//! - Validation: 入力が不正（リトライ無意味）
//! - Conflict: 予約の競合などビジネスルール違反
//! - NotFound: 明示的な ID 参照の失敗
//! - Store: 永続化層の失敗（そのまま伝播、コアではリトライしない）
//!
//! 「終了するタスクがない」「存在しない ID の削除」「まだ作られていない日付」は
//! エラーではなく `None` / 空のリストで表現します。

use thiserror::Error;

use crate::ports::task_store::StoreError;

/// ConflictKind は競合の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictKind {
    /// 同じ分に別の予約がある
    #[error("time already reserved")]
    AlreadyReserved,

    /// 完了済みタスクの区間 [start, end) に含まれる
    #[error("time already assigned")]
    AlreadyAssigned,

    /// 予約ではないタスクを予約として取り消そうとした
    #[error("task is not a reservation")]
    NotReserved,
}

/// SchedulerError はタイムライン / 予約操作のエラー
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchedulerError {
    pub fn validation(message: impl Into<String>) -> Self {
        SchedulerError::Validation(message.into())
    }
}

impl From<ConflictKind> for SchedulerError {
    fn from(kind: ConflictKind) -> Self {
        SchedulerError::Conflict(kind)
    }
}
