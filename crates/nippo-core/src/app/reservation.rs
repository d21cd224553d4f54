//! ReservationManager - 予約の登録と、期限が来た予約の昇格
//!
//! # 予約のルール
//! - 予約は今日だけ
//! - 同じ分に予約は 1 件まで（`AlreadyReserved`）
//! - 完了済みタスクの区間 [start, end) に入る時刻は予約できない（`AlreadyAssigned`）
//! - 実行中のタスクは予約を妨げない（昇格時に終了させる）
//!
//! # 昇格
//! `process_due_reservations` は何度呼んでも安全です（新しく期限が来た予約が
//! なければ何も書きません）。定期実行は `ReservationPoller` が行います。

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::context::SchedulerContext;
use crate::domain::errors::{ConflictKind, SchedulerError};
use crate::domain::ids::{TaskId, position_of};
use crate::domain::task::TaskRecord;
use crate::domain::time::{format_from_minutes, parse_to_minutes};

/// process_due_reservations の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionOutcome {
    /// 保存が発生したか
    pub changed: bool,
    /// 昇格した予約（処理後の状態、開始時刻順）
    pub promoted: Vec<TaskRecord>,
}

#[derive(Clone)]
pub struct ReservationManager {
    ctx: Arc<SchedulerContext>,
}

impl ReservationManager {
    pub fn new(ctx: Arc<SchedulerContext>) -> Self {
        Self { ctx }
    }

    /// 今日の `start_time` に予約を入れる。
    pub async fn add_reservation(
        &self,
        date: Option<NaiveDate>,
        name: &str,
        start_time: &str,
        tag: Option<&str>,
    ) -> Result<TaskRecord, SchedulerError> {
        let today = self.ctx.today();
        if date.is_some_and(|d| d != today) {
            return Err(SchedulerError::validation("reservations are only supported for today"));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(SchedulerError::validation("task name must not be empty"));
        }
        let start_time = start_time.trim();
        if start_time.is_empty() {
            return Err(SchedulerError::validation("start time must not be empty"));
        }
        let minute = parse_to_minutes(start_time).ok_or_else(|| {
            SchedulerError::validation(format!("start time is not a valid time: {start_time}"))
        })?;

        let _guard = self.ctx.locks.lock(today).await;
        let mut tasks = self.ctx.store.load_schedule(today).await?;

        if let Some(kind) = find_conflict(&tasks, minute) {
            debug!(date = %today, start = %start_time, ?kind, "reservation rejected");
            return Err(kind.into());
        }

        let reservation = TaskRecord::reserved(
            self.ctx.ids.generate_task_id(),
            name,
            tag.map(|t| t.trim().to_string()),
            format_from_minutes(minute),
            today,
            self.ctx.clock.now(),
        );
        tasks.push(reservation.clone());
        self.ctx.store.save_schedule(today, &tasks).await?;

        info!(
            date = %today,
            task_id = %reservation.id,
            name = %reservation.name,
            start = %reservation.start_time,
            "reservation added"
        );
        Ok(reservation)
    }

    /// 期限が来た予約を実行中に昇格させる。
    ///
    /// 今日は現在時刻（丸めなし）まで、過去の日付はすべての予約が期限切れ、
    /// 未来の日付は何もしません。
    pub async fn process_due_reservations(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<PromotionOutcome, SchedulerError> {
        let today = self.ctx.today();
        let date = self.ctx.resolve_date(date);
        let now_minute = match date.cmp(&today) {
            std::cmp::Ordering::Equal => self.ctx.current_minute(),
            std::cmp::Ordering::Less => u32::MAX,
            std::cmp::Ordering::Greater => return Ok(PromotionOutcome::default()),
        };

        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;

        let mut due: Vec<(usize, u32)> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_reserved())
            .filter_map(|(i, t)| t.start_minutes().map(|m| (i, m)))
            .filter(|&(_, m)| m <= now_minute)
            .collect();
        if due.is_empty() {
            return Ok(PromotionOutcome::default());
        }
        due.sort_by_key(|&(_, m)| m);

        let now = self.ctx.clock.now();
        for &(index, _) in &due {
            let start = tasks[index].start_time.clone();
            for (i, task) in tasks.iter_mut().enumerate() {
                if i != index && task.is_running() {
                    task.close(start.clone(), now);
                    info!(%date, task_id = %task.id, end = %start, "task closed by reservation");
                }
            }
            tasks[index].promote(now);
            info!(%date, task_id = %tasks[index].id, start = %start, "reservation promoted");
        }

        self.ctx.store.save_schedule(date, &tasks).await?;
        let promoted = due.iter().map(|&(i, _)| tasks[i].clone()).collect();
        Ok(PromotionOutcome {
            changed: true,
            promoted,
        })
    }

    /// 予約を取り消す。
    ///
    /// 見つからなければ `None`。予約ではないタスクなら `Conflict(NotReserved)`。
    pub async fn cancel_reservation(
        &self,
        date: Option<NaiveDate>,
        id: &TaskId,
    ) -> Result<Option<TaskRecord>, SchedulerError> {
        let date = self.ctx.resolve_date(date);
        let _guard = self.ctx.locks.lock(date).await;
        let mut tasks = self.ctx.store.load_schedule(date).await?;

        let Some(index) = position_of(tasks.iter().map(|t| &t.id), id) else {
            return Ok(None);
        };
        if !tasks[index].is_reserved() {
            return Err(ConflictKind::NotReserved.into());
        }
        let removed = tasks.remove(index);

        self.ctx.store.save_schedule(date, &tasks).await?;
        info!(%date, task_id = %removed.id, "reservation cancelled");
        Ok(Some(removed))
    }

    /// 今日の予約一覧（開始時刻順、読めない時刻は末尾）
    pub async fn reservations(&self) -> Result<Vec<TaskRecord>, SchedulerError> {
        let today = self.ctx.today();
        let mut reserved: Vec<TaskRecord> = self
            .ctx
            .store
            .load_schedule(today)
            .await?
            .into_iter()
            .filter(TaskRecord::is_reserved)
            .collect();
        reserved.sort_by_key(|t| t.start_minutes().unwrap_or(u32::MAX));
        Ok(reserved)
    }
}

/// `minute` に予約を入れられない理由
fn find_conflict(tasks: &[TaskRecord], minute: u32) -> Option<ConflictKind> {
    if tasks
        .iter()
        .filter(|t| t.is_reserved())
        .any(|t| t.start_minutes() == Some(minute))
    {
        return Some(ConflictKind::AlreadyReserved);
    }

    let assigned = tasks.iter().filter(|t| t.is_completed()).any(|t| {
        matches!(
            (t.start_minutes(), t.end_minutes()),
            (Some(start), Some(end)) if start <= minute && minute < end
        )
    });
    assigned.then_some(ConflictKind::AlreadyAssigned)
}
