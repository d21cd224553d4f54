//! SchedulerContext - スケジューラが共有する依存とローカル時刻の解決
//!
//! TimelineScheduler と ReservationManager は同じ Context を `Arc` で共有し、
//! 同じストア・時計・日付ロックを使います。

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;

use super::locks::DateLocks;
use crate::domain::rounding::RoundingConfig;
use crate::domain::time::format_from_minutes;
use crate::ports::{Clock, IdGenerator, TaskStore};

/// 既定のタイムゾーン
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Asia::Tokyo;

/// スケジューラの設定値
///
/// モジュールのグローバル状態ではなく、インスタンスごとに保持します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub rounding: RoundingConfig,
    /// 「今日」と「いま何分か」を決めるタイムゾーン（日付の境界はこのゾーンの 0 時）
    pub time_zone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rounding: RoundingConfig::default(),
            time_zone: DEFAULT_TIME_ZONE,
        }
    }
}

pub struct SchedulerContext {
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) config: SchedulerConfig,
    pub(crate) locks: DateLocks,
}

impl SchedulerContext {
    pub fn new(
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            clock,
            ids,
            config,
            locks: DateLocks::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// 設定タイムゾーンでの現在のローカル日時
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock
            .now()
            .with_timezone(&self.config.time_zone)
            .naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// `None` を今日に解決
    pub fn resolve_date(&self, date: Option<NaiveDate>) -> NaiveDate {
        date.unwrap_or_else(|| self.today())
    }

    /// 丸めなしの現在時刻（その日の何分目か）
    pub fn current_minute(&self) -> u32 {
        let now = self.local_now();
        now.hour() * 60 + now.minute()
    }

    /// 丸め設定を適用した現在時刻の表示文字列
    pub fn current_display_time(&self) -> String {
        let rounded = self.config.rounding.apply(self.local_now());
        format_from_minutes(rounded.hour() * 60 + rounded.minute())
    }
}
