//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 方針
//! - ports の実装を差し込んで TimelineScheduler / ReservationManager を組み立てる
//! - 起動時検証（Fail-fast 設計）: ストア未設定や不正な丸め設定は build() で弾く

use std::sync::Arc;
use std::time::Duration;

use super::context::{SchedulerConfig, SchedulerContext};
use super::poller::ReservationPoller;
use super::reservation::ReservationManager;
use super::timeline::TimelineScheduler;
use crate::config::{ConfigError, validate_rounding};
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```
/// use std::sync::Arc;
/// use nippo_core::app::AppBuilder;
/// use nippo_core::impls::InMemoryTaskStore;
///
/// let app = AppBuilder::new()
///     .store(Arc::new(InMemoryTaskStore::new()))
///     .build()
///     .expect("store is set");
/// # let _ = app;
/// ```
///
/// # 既定値
/// - clock: SystemClock
/// - id generator: clock を共有する UlidGenerator
/// - config: 丸めなし、Asia/Tokyo
#[derive(Default)]
pub struct AppBuilder {
    store: Option<Arc<dyn TaskStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: SchedulerConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No task store configured. Call AppBuilder::store() before build().")]
    MissingStore,

    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - store() が呼ばれていなければ BuildError::MissingStore
    /// - 丸め間隔が 1 日を超えていれば BuildError::InvalidConfig
    pub fn build(self) -> Result<App, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        validate_rounding(&self.config.rounding)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        let ctx = Arc::new(SchedulerContext::new(store, clock, ids, self.config));
        Ok(App {
            timeline: TimelineScheduler::new(Arc::clone(&ctx)),
            reservations: ReservationManager::new(ctx),
        })
    }
}

/// App はアプリケーションのランタイム
///
/// 2 つのサービスは同じ Context（ストア・時計・日付ロック）を共有します。
#[derive(Clone)]
pub struct App {
    pub timeline: TimelineScheduler,
    pub reservations: ReservationManager,
}

impl App {
    /// 予約の定期昇格を開始
    pub fn spawn_poller(&self, interval: Duration) -> ReservationPoller {
        ReservationPoller::spawn(self.reservations.clone(), interval)
    }
}
