mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nippo_core::app::{App, AppBuilder, TaskUpdate};
use nippo_core::config::AppConfig;
use nippo_core::domain::RoundingConfig;
use nippo_core::domain::time::{duration_minutes, format_duration_ja};
use nippo_core::impls::JsonFileTaskStore;
use nippo_core::observability::DaySummary;
use nippo_core::ports::{Clock, SystemClock};
use nippo_core::{TaskId, TaskRecord};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigCommand};

/// Log filter env var, checked before `RUST_LOG`.
const LOG_ENV: &str = "NIPPO_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let loading = || format!("loading {}", config_path.display());

    match cli.command {
        Command::Config(cmd) => {
            // unvalidated, so a broken value can still be overwritten
            let config = AppConfig::read_from(&config_path).with_context(loading)?;
            run_config(cmd, config, &config_path)
        }
        command => {
            let config = AppConfig::load_from(&config_path).with_context(loading)?;
            debug!(path = %config_path.display(), ?config, "config loaded");
            let app = build_app(&config)?;
            run(command, &app).await
        }
    }
}

fn init_tracing(verbose: bool) {
    // stdout is reserved for command output
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_app(config: &AppConfig) -> Result<App> {
    let data_dir = config.resolved_data_dir()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = JsonFileTaskStore::with_clock(data_dir, Arc::clone(&clock));

    let app = AppBuilder::new()
        .store(Arc::new(store))
        .clock(clock)
        .config(config.scheduler_config()?)
        .build()?;
    Ok(app)
}

async fn run(command: Command, app: &App) -> Result<()> {
    let timeline = &app.timeline;
    let reservations = &app.reservations;

    match command {
        Command::Add { name, tag, at, date } => {
            let task = timeline
                .add_task(date.date, &name, tag.as_deref(), at.as_deref())
                .await?;
            println!("started {}", task_line(&task));
        }
        Command::End { date } => match timeline.end_current_task(date.date).await? {
            Some(task) => println!("ended {}", task_line(&task)),
            None => println!("no running task"),
        },
        Command::Update {
            id,
            name,
            start,
            end,
            tag,
            memo,
            date,
        } => {
            let update = TaskUpdate {
                name,
                start_time: start,
                end_time: end,
                tag,
                memo,
            };
            let outcome = timeline
                .update_task(date.date, &TaskId::parse(&id), update)
                .await?;
            println!("updated {}", task_line(&outcome.task));
            for adj in &outcome.adjustments {
                println!(
                    "  adjusted {} {:?}: {} -> {} ({})",
                    adj.task_id, adj.field, adj.old_value, adj.new_value, adj.reason
                );
            }
        }
        Command::Delete { id, date } => {
            match timeline.delete_task(date.date, &TaskId::parse(&id)).await? {
                Some(task) => println!("deleted {}", task_line(&task)),
                None => println!("no task with id {id}"),
            }
        }
        Command::Reserve { name, at, tag } => {
            let task = reservations
                .add_reservation(None, &name, &at, tag.as_deref())
                .await?;
            println!("reserved {}", task_line(&task));
        }
        Command::Cancel { id } => {
            match reservations.cancel_reservation(None, &TaskId::parse(&id)).await? {
                Some(task) => println!("cancelled {}", task_line(&task)),
                None => println!("no reservation with id {id}"),
            }
        }
        Command::Tick => {
            let outcome = reservations.process_due_reservations(None).await?;
            for task in &outcome.promoted {
                println!("promoted {}", task_line(task));
            }
            if !outcome.changed {
                println!("nothing due");
            }
        }
        Command::List { date, json } => {
            let tasks = timeline.tasks(date.date).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                for task in &tasks {
                    println!("{}", task_line(task));
                }
            }
        }
        Command::Text { date } => {
            println!("{}", timeline.timeline_text(date.date).await?);
        }
        Command::Summary { date } => {
            print_summary(&timeline.summary(date.date).await?);
        }
        Command::History { date: Some(date) } => match timeline.history(date).await? {
            Some(tasks) => {
                for task in &tasks {
                    println!("{}", task_line(task));
                }
            }
            None => println!("no records for {date}"),
        },
        Command::History { date: None } => {
            for date in timeline.history_dates().await? {
                println!("{date}");
            }
        }
        Command::Record {
            name,
            start,
            end,
            tag,
            date,
        } => {
            let task = timeline
                .add_history_task(date, &name, &start, end.as_deref(), tag.as_deref())
                .await?;
            println!("recorded {}", task_line(&task));
        }
        Command::Forget { date } => {
            if timeline.delete_history(date).await? {
                println!("deleted history for {date}");
            } else {
                println!("no records for {date}");
            }
        }
        Command::Clear { date } => {
            timeline.clear_day(date.date).await?;
            println!("cleared");
        }
        Command::Watch { interval_secs } => {
            let poller = app.spawn_poller(Duration::from_secs(interval_secs.max(1)));
            tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
            poller.shutdown_and_join().await;
        }
        Command::Config(_) => anyhow::bail!("config commands run without the scheduler"),
    }
    Ok(())
}

fn run_config(cmd: ConfigCommand, mut config: AppConfig, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        ConfigCommand::Rounding { interval, mode } => {
            config.rounding = RoundingConfig::new(interval, mode);
        }
        ConfigCommand::Zone { time_zone } => {
            config.time_zone = time_zone;
        }
    }
    config
        .save_to(path)
        .with_context(|| format!("saving {}", path.display()))?;
    println!("saved {}", path.display());
    Ok(())
}

/// `task-01J.. 完了  午前 9:00 - 午前 10:30 (1時間30分)  Design [dev]`
fn task_line(task: &TaskRecord) -> String {
    let state = if task.is_reserved() {
        "予約"
    } else if task.is_running() {
        "実行中"
    } else {
        "完了"
    };
    let span = match task.end_time.as_deref() {
        Some(end) => match duration_minutes(&task.start_time, end) {
            Some(m) => format!("{} - {end} ({})", task.start_time, format_duration_ja(m)),
            None => format!("{} - {end}", task.start_time),
        },
        None => task.start_time.clone(),
    };
    let tag = if task.tag.is_empty() {
        String::new()
    } else {
        format!(" [{}]", task.tag)
    };
    format!("{}  {state}  {span}  {}{tag}", task.id, task.name)
}

fn print_summary(summary: &DaySummary) {
    println!("tasks:     {}", summary.total);
    println!("completed: {}", summary.completed);
    println!("running:   {}", summary.running);
    println!("reserved:  {}", summary.reserved);
    println!("worked:    {}", format_duration_ja(summary.completed_minutes));
}
