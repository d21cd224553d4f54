//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use nippo_core::app::DEFAULT_POLL_INTERVAL;
use nippo_core::domain::RoundingMode;

#[derive(Parser, Debug)]
#[command(name = "nippo", author, version, about = "日報タイムライン", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct DateArg {
    /// Target date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a task (closes the running one)
    Add {
        name: String,
        #[arg(long)]
        tag: Option<String>,
        /// Start time, e.g. 09:30 or "午前 9:30" (defaults to now)
        #[arg(long)]
        at: Option<String>,
        #[command(flatten)]
        date: DateArg,
    },

    /// End the running task now
    End {
        #[command(flatten)]
        date: DateArg,
    },

    /// Edit a task; overlapping neighbours are adjusted
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        memo: Option<String>,
        #[command(flatten)]
        date: DateArg,
    },

    /// Delete a task
    Delete {
        id: String,
        #[command(flatten)]
        date: DateArg,
    },

    /// Reserve a task to start later today
    Reserve {
        name: String,
        #[arg(long)]
        at: String,
        #[arg(long)]
        tag: Option<String>,
    },

    /// Cancel a reservation
    Cancel {
        id: String,
    },

    /// Promote reservations whose start time has come
    Tick,

    /// Show the timeline
    List {
        #[command(flatten)]
        date: DateArg,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plain-text timeline for pasting into a report
    Text {
        #[command(flatten)]
        date: DateArg,
    },

    /// Counts and total completed time
    Summary {
        #[command(flatten)]
        date: DateArg,
    },

    /// List past dates, or show one with --date
    History {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add a finished record to a date without touching the running task
    Record {
        name: String,
        #[arg(long)]
        start: String,
        /// Omit to record a running task (rejected if one is already running)
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Delete a date's history entirely
    Forget {
        date: NaiveDate,
    },

    /// Remove every task of the day
    Clear {
        #[command(flatten)]
        date: DateArg,
    },

    /// Show or change the configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Keep promoting reservations until Ctrl-C
    Watch {
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval_secs: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Set the rounding applied to "now"
    Rounding {
        /// Interval in minutes (0 disables rounding)
        #[arg(long)]
        interval: u32,
        #[arg(long, default_value_t = RoundingMode::Nearest)]
        mode: RoundingMode,
    },

    /// Set the time zone (IANA name, e.g. Asia/Tokyo)
    Zone {
        time_zone: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_options() {
        let cli = Cli::try_parse_from(["nippo", "add", "Design", "--tag", "dev", "--at", "09:00"]).unwrap();
        match cli.command {
            Command::Add { name, tag, at, date } => {
                assert_eq!(name, "Design");
                assert_eq!(tag.as_deref(), Some("dev"));
                assert_eq!(at.as_deref(), Some("09:00"));
                assert!(date.date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_dates_and_rounding_mode() {
        let cli = Cli::try_parse_from(["nippo", "list", "--date", "2025-03-14", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::List { date: DateArg { date: Some(_) }, json: true }
        ));

        let cli = Cli::try_parse_from(["nippo", "config", "rounding", "--interval", "15", "--mode", "ceil"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Rounding { interval: 15, mode: RoundingMode::Ceil })
        ));

        assert!(Cli::try_parse_from(["nippo", "list", "--date", "14/03/2025"]).is_err());
    }

    #[test]
    fn record_requires_a_date() {
        assert!(Cli::try_parse_from(["nippo", "record", "Review", "--start", "13:00"]).is_err());

        let cli = Cli::try_parse_from([
            "nippo", "record", "Review", "--start", "13:00", "--end", "14:30", "--date", "2025-03-13",
        ])
        .unwrap();
        match cli.command {
            Command::Record { name, end, date, .. } => {
                assert_eq!(name, "Review");
                assert_eq!(end.as_deref(), Some("14:30"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn watch_defaults_to_poll_interval() {
        let cli = Cli::try_parse_from(["nippo", "watch"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Watch { interval_secs } if interval_secs == DEFAULT_POLL_INTERVAL.as_secs()
        ));
    }
}
