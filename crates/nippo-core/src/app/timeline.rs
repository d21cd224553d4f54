//! TimelineScheduler - 1 日のタイムラインに対する操作
//!
//! # 操作の流れ
//! すべての変更操作は「日付ロック → load → メモリ上で変更 → save 1 回 → 解放」です。
//! 検証エラーは変更前に検出するので、途中まで書かれた状態は残りません。
//!
//! # 不変条件
//! - 同じ日付で実行中のタスクは高々 1 件
//! - 予約には終了時刻がない
//! - ID は再利用しない（削除しても振り直さない）

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::context::SchedulerContext;
use crate::domain::adjustment::{Adjustment, adjust};
use crate::domain::errors::SchedulerError;
use crate::domain::ids::{TaskId, position_of};
use crate::domain::task::TaskRecord;
use crate::domain::time::{normalize_display, parse_to_minutes};
use crate::observability::DaySummary;

/// 予約行のプレフィックス（テキスト出力）
pub const RESERVED_LINE_PREFIX: &str = "(予約)";

/// update_task の入力
///
/// `tag` / `memo` が `None` のときは現在の値を保持します。
/// `end_time` が `None` または空文字なら終了時刻なし（実行中）です。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub name: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub tag: Option<String>,
    pub memo: Option<String>,
}

/// update_task の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub task: TaskRecord,
    /// 隣接タスクに加えた自動調整
    pub adjustments: Vec<Adjustment>,
}

/// TimelineScheduler はタスクの開始・終了・編集・削除を扱う
#[derive(Clone)]
pub struct TimelineScheduler {
    ctx: Arc<SchedulerContext>,
}

impl TimelineScheduler {
    pub fn new(ctx: Arc<SchedulerContext>) -> Self {
        Self { ctx }
    }

    /// 新しいタスクを開始する。
    ///
    /// 実行中のタスクはすべて新しいタスクの開始時刻で終了します。
    /// `start_time` を省略すると現在時刻（丸め適用）を使います。
    pub async fn add_task(
        &self,
        date: Option<NaiveDate>,
        name: &str,
        tag: Option<&str>,
        start_time: Option<&str>,
    ) -> Result<TaskRecord, SchedulerError> {
        let name = require_non_empty(name, "task name")?;
        let start = match start_time.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => normalize_display(raw).ok_or_else(|| {
                SchedulerError::validation(format!("start time is not a valid time: {raw}"))
            })?,
            None => self.ctx.current_display_time(),
        };

        let date = self.ctx.resolve_date(date);
        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;
        let now = self.ctx.clock.now();

        for task in tasks.iter_mut().filter(|t| t.is_running()) {
            task.close(start.clone(), now);
            info!(%date, task_id = %task.id, end = %start, "task closed by new task");
        }

        let task = TaskRecord::started(
            self.ctx.ids.generate_task_id(),
            name,
            tag.map(|t| t.trim().to_string()),
            start,
            date,
            now,
        );
        tasks.push(task.clone());
        self.ctx.store.save_schedule(date, &tasks).await?;

        info!(%date, task_id = %task.id, name = %task.name, start = %task.start_time, "task started");
        Ok(task)
    }

    /// 実行中のタスクを現在時刻（丸め適用）で終了する。
    ///
    /// 実行中のタスクがなければ `None`（書き込みなし）。
    pub async fn end_current_task(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Option<TaskRecord>, SchedulerError> {
        let date = self.ctx.resolve_date(date);
        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;

        let Some(task) = tasks.iter_mut().rev().find(|t| t.is_running()) else {
            debug!(%date, "no running task to end");
            return Ok(None);
        };
        let end = self.ctx.current_display_time();
        task.close(end, self.ctx.clock.now());
        let ended = task.clone();

        self.ctx.store.save_schedule(date, &tasks).await?;
        info!(%date, task_id = %ended.id, end = ?ended.end_time, "task ended");
        Ok(Some(ended))
    }

    /// タスクを編集し、隣接タスクとの重なりを解消する。
    pub async fn update_task(
        &self,
        date: Option<NaiveDate>,
        id: &TaskId,
        update: TaskUpdate,
    ) -> Result<UpdateOutcome, SchedulerError> {
        let name = require_non_empty(&update.name, "task name")?;
        let start = require_non_empty(&update.start_time, "start time")?;
        let end = update
            .end_time
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let (Some(s), Some(e)) = (
            parse_to_minutes(&start),
            end.as_deref().and_then(parse_to_minutes),
        ) && e < s
        {
            return Err(SchedulerError::validation(format!(
                "end time {} is before start time {start}",
                end.as_deref().unwrap_or_default()
            )));
        }

        let date = self.ctx.resolve_date(date);
        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;

        let index = position_of(tasks.iter().map(|t| &t.id), id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;

        let target = &tasks[index];
        if target.is_reserved() && end.is_some() {
            return Err(SchedulerError::validation("a reservation cannot have an end time"));
        }
        if !target.is_reserved()
            && end.is_none()
            && tasks
                .iter()
                .enumerate()
                .any(|(i, t)| i != index && t.is_running())
        {
            return Err(SchedulerError::validation(
                "another task is already running; give this task an end time",
            ));
        }

        let adjustments = adjust(&mut tasks, index, &start, end.as_deref());
        let now = self.ctx.clock.now();
        for adjustment in &adjustments {
            tasks[adjustment.index].touch(now);
            info!(
                %date,
                task_id = %adjustment.task_id,
                field = ?adjustment.field,
                from = %adjustment.old_value,
                to = %adjustment.new_value,
                "neighbour adjusted"
            );
        }

        let task = &mut tasks[index];
        task.name = name;
        task.start_time = normalize_display(&start).unwrap_or(start);
        task.end_time = end.map(|e| normalize_display(&e).unwrap_or(e));
        if let Some(tag) = update.tag {
            task.tag = tag.trim().to_string();
        }
        if let Some(memo) = update.memo {
            task.memo = memo;
        }
        task.touch(now);
        let task = task.clone();

        self.ctx.store.save_schedule(date, &tasks).await?;
        info!(%date, task_id = %task.id, adjusted = adjustments.len(), "task updated");
        Ok(UpdateOutcome { task, adjustments })
    }

    /// タスクを削除する。存在しなければ `None`（書き込みなし）。
    pub async fn delete_task(
        &self,
        date: Option<NaiveDate>,
        id: &TaskId,
    ) -> Result<Option<TaskRecord>, SchedulerError> {
        let date = self.ctx.resolve_date(date);
        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;

        let Some(index) = position_of(tasks.iter().map(|t| &t.id), id) else {
            debug!(%date, task_id = %id, "delete: no such task");
            return Ok(None);
        };
        let removed = tasks.remove(index);

        self.ctx.store.save_schedule(date, &tasks).await?;
        info!(%date, task_id = %removed.id, "task deleted");
        Ok(Some(removed))
    }

    /// ID でタスクを引く。見つからなければ `NotFound`。
    pub async fn find_task(
        &self,
        date: Option<NaiveDate>,
        id: &TaskId,
    ) -> Result<TaskRecord, SchedulerError> {
        let tasks = self.tasks(date).await?;
        position_of(tasks.iter().map(|t| &t.id), id)
            .map(|index| tasks[index].clone())
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    /// その日のタスク一覧（保存順）
    pub async fn tasks(&self, date: Option<NaiveDate>) -> Result<Vec<TaskRecord>, SchedulerError> {
        let date = self.ctx.resolve_date(date);
        Ok(self.ctx.store.load_schedule(date).await?)
    }

    pub async fn running_task(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Option<TaskRecord>, SchedulerError> {
        let tasks = self.tasks(date).await?;
        Ok(tasks.into_iter().rev().find(TaskRecord::is_running))
    }

    /// その日のタスクをすべて消す（空のリストを保存）
    pub async fn clear_day(&self, date: Option<NaiveDate>) -> Result<(), SchedulerError> {
        let date = self.ctx.resolve_date(date);
        let _guard = self.ctx.locks.lock(date).await;
        self.ctx.store.save_schedule(date, &[]).await?;
        info!(%date, "day cleared");
        Ok(())
    }

    /// 指定日に記録を後から書き足す。
    ///
    /// `add_task` と違い、実行中のタスクは終了させません。`end_time` を
    /// 省略すると実行中の記録になるので、すでに実行中のタスクがあれば拒否します。
    pub async fn add_history_task(
        &self,
        date: NaiveDate,
        name: &str,
        start_time: &str,
        end_time: Option<&str>,
        tag: Option<&str>,
    ) -> Result<TaskRecord, SchedulerError> {
        let name = require_non_empty(name, "task name")?;
        let start_raw = require_non_empty(start_time, "start time")?;
        let start = normalize_display(&start_raw).ok_or_else(|| {
            SchedulerError::validation(format!("start time is not a valid time: {start_raw}"))
        })?;
        let end = match end_time.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(normalize_display(raw).ok_or_else(|| {
                SchedulerError::validation(format!("end time is not a valid time: {raw}"))
            })?),
            None => None,
        };
        if let Some(end) = &end
            && parse_to_minutes(end) < parse_to_minutes(&start)
        {
            return Err(SchedulerError::validation(format!(
                "end time {end} is before start time {start}"
            )));
        }

        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;
        if end.is_none() && tasks.iter().any(TaskRecord::is_running) {
            return Err(SchedulerError::validation(
                "another task is already running; give this record an end time",
            ));
        }

        let now = self.ctx.clock.now();
        let mut task = TaskRecord::started(
            self.ctx.ids.generate_task_id(),
            name,
            tag.map(|t| t.trim().to_string()),
            start,
            date,
            now,
        );
        if let Some(end) = end {
            task.close(end, now);
        }
        tasks.push(task.clone());
        self.ctx.store.save_schedule(date, &tasks).await?;

        info!(%date, task_id = %task.id, name = %task.name, "history record added");
        Ok(task)
    }

    /// 指定日の記録をストアごと消す。`clear_day` と違い履歴の一覧からも消える。
    pub async fn delete_history(&self, date: NaiveDate) -> Result<bool, SchedulerError> {
        let _guard = self.ctx.locks.lock(date).await;
        let deleted = self.ctx.store.delete_schedule(date).await?;
        info!(%date, deleted, "history deleted");
        Ok(deleted)
    }

    /// 日報に貼るためのプレーンテキスト（1 行 1 タスク）
    pub async fn timeline_text(&self, date: Option<NaiveDate>) -> Result<String, SchedulerError> {
        let tasks = self.tasks(date).await?;
        Ok(render_timeline(&tasks))
    }

    pub async fn summary(&self, date: Option<NaiveDate>) -> Result<DaySummary, SchedulerError> {
        let tasks = self.tasks(date).await?;
        Ok(DaySummary::from_tasks(&tasks))
    }

    /// 保存済みの過去の日付（今日を除く、新しい順）
    pub async fn history_dates(&self) -> Result<Vec<NaiveDate>, SchedulerError> {
        let today = self.ctx.today();
        let mut dates: Vec<NaiveDate> = self
            .ctx
            .store
            .list_dates()
            .await?
            .into_iter()
            .filter(|d| *d != today)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    /// 指定日の記録。ストアがなければ `None`（エラーではない）。
    pub async fn history(&self, date: NaiveDate) -> Result<Option<Vec<TaskRecord>>, SchedulerError> {
        if !self.ctx.store.schedule_exists(date).await? {
            return Ok(None);
        }
        Ok(Some(self.ctx.store.load_schedule(date).await?))
    }
}

/// タスク一覧をテキストにする
///
/// - 予約: `(予約) 午前 11:00 Standup [mtg]`
/// - 完了: `午前 9:00 - 午前 10:30 Design`
/// - 実行中: `午前 10:30 -  Code`
pub fn render_timeline(tasks: &[TaskRecord]) -> String {
    tasks
        .iter()
        .map(|t| {
            let tag = if t.tag.is_empty() {
                String::new()
            } else {
                format!(" [{}]", t.tag)
            };
            match (t.is_reserved(), t.end_time.as_deref()) {
                (true, _) => format!("{RESERVED_LINE_PREFIX} {} {}{tag}", t.start_time, t.name),
                (false, Some(end)) => format!("{} - {end} {}{tag}", t.start_time, t.name),
                (false, None) => format!("{} -  {}{tag}", t.start_time, t.name),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn require_non_empty(value: &str, what: &str) -> Result<String, SchedulerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchedulerError::validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}
