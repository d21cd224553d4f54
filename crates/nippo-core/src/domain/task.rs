//! Task record: one row in a day's timeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::TaskId;
use super::state::{TaskState, TaskStatus};
use super::time::parse_to_minutes;

/// One row of a day's timeline.
///
/// Design:
/// - Times are stored as display strings (`午前 9:00`), compared via minutes.
/// - `end_time == None` means running (or reserved when `status` says so).
/// - `created_at` / `updated_at` are set by the scheduler, never by callers.
/// - Records written before `createdAt` / `updatedAt` / `taskDate` existed
///   load with the epoch and [`MISSING_TASK_DATE`]; stores fill the date in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,

    pub name: String,

    #[serde(default)]
    pub tag: String,

    #[serde(default)]
    pub memo: String,

    pub start_time: String,

    /// Legacy files store `""` / `"None"` for a running task; both load as `None`.
    #[serde(default, deserialize_with = "deserialize_end_time")]
    pub end_time: Option<String>,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,

    #[serde(default = "missing_task_date")]
    pub task_date: NaiveDate,
}

/// `taskDate` placeholder for records that predate the field.
pub const MISSING_TASK_DATE: NaiveDate = NaiveDate::MIN;

fn missing_task_date() -> NaiveDate {
    MISSING_TASK_DATE
}

impl TaskRecord {
    /// Create a running task.
    pub fn started(
        id: TaskId,
        name: impl Into<String>,
        tag: Option<String>,
        start_time: impl Into<String>,
        task_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            tag: tag.unwrap_or_default(),
            memo: String::new(),
            start_time: start_time.into(),
            end_time: None,
            status: None,
            created_at: now,
            updated_at: now,
            task_date,
        }
    }

    /// Create a reservation (not running yet).
    pub fn reserved(
        id: TaskId,
        name: impl Into<String>,
        tag: Option<String>,
        start_time: impl Into<String>,
        task_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::started(id, name, tag, start_time, task_date, now);
        record.status = Some(TaskStatus::Reserved);
        record
    }

    pub fn state(&self) -> TaskState {
        TaskState::derive(self.status, self.end_time.is_some())
    }

    pub fn is_reserved(&self) -> bool {
        self.state() == TaskState::Reserved
    }

    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state() == TaskState::Completed
    }

    pub fn start_minutes(&self) -> Option<u32> {
        parse_to_minutes(&self.start_time)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        self.end_time.as_deref().and_then(parse_to_minutes)
    }

    /// Close the task at `end_time`.
    pub fn close(&mut self, end_time: impl Into<String>, now: DateTime<Utc>) {
        self.end_time = Some(end_time.into());
        self.updated_at = now;
    }

    /// Reservation -> running.
    pub fn promote(&mut self, now: DateTime<Utc>) {
        self.status = None;
        self.end_time = None;
        self.updated_at = now;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Fill `task_date` from the enclosing document if the record had none.
    pub fn backfill_date(&mut self, date: NaiveDate) {
        if self.task_date == MISSING_TASK_DATE {
            self.task_date = date;
        }
    }
}

fn deserialize_end_time<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(s)
        }
    }))
}
