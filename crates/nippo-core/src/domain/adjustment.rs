//! ConflictResolver - 編集で生じた時間の重なりを隣接タスクだけで解消する
//!
//! # アルゴリズム
//! 1. 新しい開始 / 終了をパース（開始がパースできなければ何もしない）
//! 2. 直前のタスクの終了 > 新しい開始 なら、直前の終了を新しい開始に揃える
//! 3. 新しい終了がパースでき、直後のタスクの開始 < 新しい終了 なら、
//!    直後の開始を新しい終了に揃える
//!
//! 触るのは直前・直後の 1 件ずつだけで、それより先へは伝播させません。

use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::task::TaskRecord;
use super::time::{format_from_minutes, parse_to_minutes};

/// 前のタスクを調整したときの理由
pub const REASON_OVERLAP_WITH_NEXT: &str = "次のタスクとの重複を解消";

/// 次のタスクを調整したときの理由
pub const REASON_OVERLAP_WITH_PREVIOUS: &str = "前のタスクとの重複を解消";

/// 調整されたフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjustedField {
    StartTime,
    EndTime,
}

/// Adjustment は隣接タスクに加えた自動変更の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    /// 調整されたタスクの ID
    pub task_id: TaskId,
    /// 調整されたタスクのリスト上の位置
    pub index: usize,
    pub field: AdjustedField,
    pub old_value: String,
    pub new_value: String,
    pub reason: String,
}

/// `edited_index` の新しい開始 / 終了に合わせて隣接タスクを調整する。
///
/// `tasks` はその場で書き換えられ、加えた変更の一覧が返ります。
/// 編集対象のタスク自身は変更しません（呼び出し側が適用します）。
pub fn adjust(
    tasks: &mut [TaskRecord],
    edited_index: usize,
    new_start: &str,
    new_end: Option<&str>,
) -> Vec<Adjustment> {
    let mut adjustments = Vec::new();

    if edited_index >= tasks.len() {
        return adjustments;
    }
    let Some(start_minutes) = parse_to_minutes(new_start) else {
        return adjustments;
    };
    let end_minutes = new_end.and_then(parse_to_minutes);

    if let Some(prev_index) = edited_index.checked_sub(1) {
        let prev = &mut tasks[prev_index];
        if let Some(prev_end) = prev.end_minutes()
            && prev_end > start_minutes
        {
            let new_value = format_from_minutes(start_minutes);
            prev.end_time = Some(new_value.clone());
            adjustments.push(Adjustment {
                task_id: prev.id.clone(),
                index: prev_index,
                field: AdjustedField::EndTime,
                old_value: format_from_minutes(prev_end),
                new_value,
                reason: REASON_OVERLAP_WITH_NEXT.to_string(),
            });
        }
    }

    if let Some(end_minutes) = end_minutes
        && let Some(next) = tasks.get_mut(edited_index + 1)
        && let Some(next_start) = next.start_minutes()
        && next_start < end_minutes
    {
        let new_value = format_from_minutes(end_minutes);
        next.start_time = new_value.clone();
        adjustments.push(Adjustment {
            task_id: next.id.clone(),
            index: edited_index + 1,
            field: AdjustedField::StartTime,
            old_value: format_from_minutes(next_start),
            new_value,
            reason: REASON_OVERLAP_WITH_PREVIOUS.to_string(),
        });
    }

    adjustments
}
