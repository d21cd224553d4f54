//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! スケジューラは永続化・時刻・ID 生成をすべてここの trait 経由で扱い、
//! 実装の詳細（ファイル、メモリ、OS の時計）を知りません。

pub mod clock;
pub mod id_generator;
pub mod task_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, SequenceIdGenerator, UlidGenerator};
pub use self::task_store::{StoreError, TaskStore};
