//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発・テスト用の正本
//! - **JsonFileTaskStore**: 日付ごとの JSON ファイル（CLI が使う）
//!
//! Clock / IdGenerator の実装は ports 側に同居しています。

pub mod inmem_store;
pub mod json_store;

// 主要な型を再エクスポート
pub use self::inmem_store::InMemoryTaskStore;
pub use self::json_store::{JsonFileTaskStore, ScheduleDocument};
