//! nippo-core
//!
//! Core building blocks for the nippo daily-report timeline.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, state, time, rounding, adjustment, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, timeline, reservation, poller, locks）
//! - **impls**: 実装（InMemoryTaskStore, JsonFileTaskStore）
//! - **config**: TOML 設定
//! - **observability**: 1 日分の集計ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{App, AppBuilder};
pub use domain::{SchedulerError, TaskId, TaskRecord};
