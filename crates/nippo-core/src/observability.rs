use serde::{Deserialize, Serialize};

use crate::domain::state::TaskState;
use crate::domain::task::TaskRecord;
use crate::domain::time::duration_minutes;

/// 1 日分のタイムラインの集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub reserved: usize,
    /// 完了タスクの合計時間（分）。時刻が読めない / 逆転しているものは除外
    pub completed_minutes: u32,
}

impl DaySummary {
    pub fn from_tasks(tasks: &[TaskRecord]) -> Self {
        let mut summary = DaySummary {
            total: tasks.len(),
            ..DaySummary::default()
        };

        for task in tasks {
            match task.state() {
                TaskState::Running => summary.running += 1,
                TaskState::Reserved => summary.reserved += 1,
                TaskState::Completed => {
                    summary.completed += 1;
                    if let Some(end) = task.end_time.as_deref()
                        && let Some(minutes) = duration_minutes(&task.start_time, end)
                    {
                        summary.completed_minutes += minutes;
                    }
                }
            }
        }
        summary
    }
}
