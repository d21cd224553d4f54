//! End-to-end scenarios over the public API (in-memory and JSON file stores).

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use nippo_core::app::{AppBuilder, SchedulerConfig, TaskUpdate};
use nippo_core::domain::{AdjustedField, ConflictKind, RoundingConfig, RoundingMode};
use nippo_core::impls::{InMemoryTaskStore, JsonFileTaskStore};
use nippo_core::ports::{FixedClock, SequenceIdGenerator};
use nippo_core::{App, SchedulerError, TaskId};
use tempfile::TempDir;

fn jst(h: u32, m: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Tokyo
        .with_ymd_and_hms(2025, 3, 14, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn app_with(store: InMemoryTaskStore, clock: FixedClock) -> App {
    AppBuilder::new()
        .store(Arc::new(store))
        .clock(Arc::new(clock))
        .id_generator(Arc::new(SequenceIdGenerator::new()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn design_then_code_then_standup() {
    let clock = FixedClock::new(jst(9, 0));
    let app = app_with(InMemoryTaskStore::new(), clock.clone());

    app.timeline.add_task(None, "Design", None, Some("09:00")).await.unwrap();
    app.timeline.add_task(None, "Code", None, Some("10:30")).await.unwrap();

    let tasks = app.timeline.tasks(None).await.unwrap();
    assert_eq!(tasks[0].name, "Design");
    assert_eq!(tasks[0].end_time.as_deref(), Some("午前 10:30"));
    assert!(tasks[1].is_running());

    clock.set(jst(10, 40));
    app.reservations.add_reservation(None, "Standup", "11:00", Some("mtg")).await.unwrap();

    clock.set(jst(11, 0));
    let outcome = app.reservations.process_due_reservations(None).await.unwrap();
    assert!(outcome.changed);

    let tasks = app.timeline.tasks(None).await.unwrap();
    let code = tasks.iter().find(|t| t.name == "Code").unwrap();
    let standup = tasks.iter().find(|t| t.name == "Standup").unwrap();
    assert_eq!(code.end_time.as_deref(), Some("午前 11:00"));
    assert!(standup.is_running());
    assert_eq!(standup.status, None);
    assert_eq!(tasks.iter().filter(|t| t.is_running()).count(), 1);

    let text = app.timeline.timeline_text(None).await.unwrap();
    assert_eq!(
        text,
        "午前 9:00 - 午前 10:30 Design\n午前 10:30 - 午前 11:00 Code\n午前 11:00 -  Standup [mtg]"
    );
}

#[tokio::test]
async fn reservation_inside_completed_task_is_rejected() {
    let clock = FixedClock::new(jst(13, 30));
    let app = app_with(InMemoryTaskStore::new(), clock.clone());

    app.timeline.add_task(None, "Lunch", None, None).await.unwrap();

    // running task does not block
    let ok = app.reservations.add_reservation(None, "Sync", "午後 2:00", None).await;
    assert!(ok.is_ok());
    app.reservations.cancel_reservation(None, &ok.unwrap().id).await.unwrap();

    clock.set(jst(14, 30));
    app.timeline.end_current_task(None).await.unwrap();

    let err = app
        .reservations
        .add_reservation(None, "Sync", "14:00", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Conflict(ConflictKind::AlreadyAssigned)));
    assert_eq!(err.to_string(), "conflict: time already assigned");
}

#[tokio::test]
async fn edit_start_clips_previous_task() {
    let clock = FixedClock::new(jst(11, 0));
    let app = app_with(InMemoryTaskStore::new(), clock);

    let a = app.timeline.add_task(None, "A", None, Some("午前 9:00")).await.unwrap();
    let b = app.timeline.add_task(None, "B", None, Some("午前 10:00")).await.unwrap();
    app.timeline.end_current_task(None).await.unwrap();

    let outcome = app
        .timeline
        .update_task(
            None,
            &b.id,
            TaskUpdate {
                name: "B".into(),
                start_time: "9:30".into(),
                end_time: Some("午前 11:00".into()),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.adjustments.len(), 1);
    let adj = &outcome.adjustments[0];
    assert_eq!(adj.task_id, a.id);
    assert_eq!(adj.field, AdjustedField::EndTime);
    assert_eq!(adj.new_value, "午前 9:30");

    let a_now = app.timeline.find_task(None, &a.id).await.unwrap();
    assert_eq!(a_now.end_time.as_deref(), Some("午前 9:30"));
}

#[tokio::test]
async fn rounding_config_applies_to_clock_times() {
    let clock = FixedClock::new(jst(9, 7));
    let app = AppBuilder::new()
        .store(Arc::new(InMemoryTaskStore::new()))
        .clock(Arc::new(clock.clone()))
        .config(SchedulerConfig {
            rounding: RoundingConfig::new(15, RoundingMode::Floor),
            ..SchedulerConfig::default()
        })
        .build()
        .unwrap();

    let task = app.timeline.add_task(None, "Design", None, None).await.unwrap();
    assert_eq!(task.start_time, "午前 9:00");

    clock.set(jst(9, 59));
    let ended = app.timeline.end_current_task(None).await.unwrap().unwrap();
    assert_eq!(ended.end_time.as_deref(), Some("午前 9:45"));
}

#[tokio::test]
async fn json_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = FixedClock::new(jst(9, 0));
    let build = || {
        AppBuilder::new()
            .store(Arc::new(JsonFileTaskStore::with_clock(dir.path(), Arc::new(clock.clone()))))
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap()
    };

    let first = build();
    let task = first.timeline.add_task(None, "Design", Some("dev"), Some("9:00")).await.unwrap();
    first.reservations.add_reservation(None, "Standup", "11:00", None).await.unwrap();
    drop(first);

    let second = build();
    let tasks = second.timeline.tasks(None).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0], task);
    assert!(tasks[1].is_reserved());

    let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    assert!(dir.path().join("history").join("2025-03-14.json").exists());
    assert!(second.timeline.history_dates().await.unwrap().is_empty());
    assert!(second.timeline.history(today).await.unwrap().is_some());
}

#[tokio::test]
async fn legacy_document_is_editable() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("history")).unwrap();
    std::fs::write(
        dir.path().join("history").join("2025-03-13.json"),
        r#"{
          "date": "2025-03-13",
          "updatedAt": "2025-03-13T09:00:00.000Z",
          "tasks": [
            {"id": 0, "name": "朝会", "tag": "", "startTime": "午前 9:00", "endTime": "午前 9:15",
             "createdAt": "2025-03-13T00:00:00.000Z", "updatedAt": "2025-03-13T00:15:00.000Z", "taskDate": "2025-03-13"},
            {"id": 1, "name": "実装", "startTime": "午前 9:15", "endTime": "",
             "createdAt": "2025-03-13T00:15:00.000Z", "updatedAt": "2025-03-13T00:15:00.000Z", "taskDate": "2025-03-13"}
          ]
        }"#,
    )
    .unwrap();

    let clock = FixedClock::new(jst(9, 0));
    let app = AppBuilder::new()
        .store(Arc::new(JsonFileTaskStore::new(dir.path())))
        .clock(Arc::new(clock))
        .build()
        .unwrap();
    let yesterday = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();

    assert_eq!(app.timeline.history_dates().await.unwrap(), vec![yesterday]);

    let running = app.timeline.running_task(Some(yesterday)).await.unwrap().unwrap();
    assert_eq!(running.id, TaskId::Numeric(1));

    let outcome = app
        .timeline
        .update_task(
            Some(yesterday),
            &TaskId::parse("1"),
            TaskUpdate {
                name: "実装".into(),
                start_time: "9:10".into(),
                end_time: Some("18:00".into()),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.task.end_time.as_deref(), Some("午後 6:00"));
    assert_eq!(outcome.adjustments[0].task_id, TaskId::Numeric(0));
    assert_eq!(outcome.adjustments[0].new_value, "午前 9:10");
}

#[tokio::test]
async fn bare_legacy_records_load_and_accept_new_tasks() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("history")).unwrap();
    std::fs::write(
        dir.path().join("history").join("2025-03-13.json"),
        r#"{"date":"2025-03-13","tasks":[
            {"id":0,"startTime":"午前 9:00","endTime":"午前 9:15","name":"朝会","isBreak":false}
        ]}"#,
    )
    .unwrap();

    let app = AppBuilder::new()
        .store(Arc::new(JsonFileTaskStore::new(dir.path())))
        .clock(Arc::new(FixedClock::new(jst(9, 0))))
        .build()
        .unwrap();
    let yesterday = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();

    let tasks = app.timeline.tasks(Some(yesterday)).await.unwrap();
    assert_eq!(tasks[0].task_date, yesterday);

    app.timeline.add_task(Some(yesterday), "実装", None, Some("9:15")).await.unwrap();
    let tasks = app.timeline.tasks(Some(yesterday)).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, TaskId::Numeric(0));
    assert!(tasks[1].is_running());
}
