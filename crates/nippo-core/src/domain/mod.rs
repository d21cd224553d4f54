//! Domain model (ids, records, time codec, rounding, conflict resolution, errors).
//!
//! ここには I/O を持たない純粋なロジックだけを置きます。
//! 永続化や時刻取得は ports 経由で app 層が扱います。

pub mod adjustment;
pub mod errors;
pub mod ids;
pub mod rounding;
pub mod state;
pub mod task;
pub mod time;

pub use adjustment::{AdjustedField, Adjustment};
pub use errors::{ConflictKind, SchedulerError};
pub use ids::TaskId;
pub use rounding::{RoundingConfig, RoundingMode};
pub use state::{TaskState, TaskStatus};
pub use task::TaskRecord;
