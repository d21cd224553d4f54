//! State - タスクの状態
//!
//! 保存される状態は `status` フィールドだけです（`None` か `reserved`）。
//! 実行中 / 完了 / 予約の区別は `status` と `endTime` から導出します。

use serde::{Deserialize, Serialize};

/// TaskStatus は保存される状態フラグ
///
/// `None`（通常タスク）とあわせて `Option<TaskStatus>` で扱います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// 未来の開始時刻で予約済み（まだ実行されていない）
    Reserved,
}

/// TaskState はタイムライン上の導出状態
///
/// # 状態遷移
/// - Reserved -> Running（予約の期限到来で昇格）
/// - Running -> Completed（終了 / 次のタスク開始で自動終了）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Reserved,
    Running,
    Completed,
}

impl TaskState {
    /// 状態を導出
    pub fn derive(status: Option<TaskStatus>, has_end_time: bool) -> Self {
        match (status, has_end_time) {
            (Some(TaskStatus::Reserved), _) => TaskState::Reserved,
            (None, false) => TaskState::Running,
            (None, true) => TaskState::Completed,
        }
    }
}
