//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **TimelineScheduler**: タスクの開始・終了・編集・削除、履歴
//! - **ReservationManager**: 予約の登録・取り消し・昇格
//! - **ReservationPoller**: 予約の定期昇格ループ
//! - **DateLocks**: 日付ごとの排他

pub mod builder;
pub mod context;
pub mod locks;
pub mod poller;
pub mod reservation;
pub mod timeline;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::context::{SchedulerConfig, SchedulerContext};
pub use self::poller::{DEFAULT_POLL_INTERVAL, ReservationPoller};
pub use self::reservation::{PromotionOutcome, ReservationManager};
pub use self::timeline::{TaskUpdate, TimelineScheduler, UpdateOutcome};
