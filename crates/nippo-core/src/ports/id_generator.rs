//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）、`task-<ULID>`
//! - **SequenceIdGenerator**: 連番（`task-1`, `task-2`, ...）、テストやフィクスチャ用

use std::sync::atomic::{AtomicU64, Ordering};

use ulid::Ulid;

use crate::domain::ids::TaskId;
use crate::ports::Clock;

/// 新しい ID に付けるプレフィックス
pub const TASK_ID_PREFIX: &str = "task-";

/// IdGenerator はタスク ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
pub trait IdGenerator: Send + Sync {
    /// Task ID を生成（常に `TaskId::Text`）
    fn generate_task_id(&self) -> TaskId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// 同じ日のタスク ID は作成順にソートできます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        TaskId::Text(format!("{TASK_ID_PREFIX}{ulid}"))
    }
}

/// SequenceIdGenerator は決定的な連番 ID
#[derive(Debug)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequenceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn generate_task_id(&self) -> TaskId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        TaskId::Text(format!("{TASK_ID_PREFIX}{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_task_id();
        let id3 = id_gen.generate_task_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
        assert!(id1.to_string().starts_with(TASK_ID_PREFIX));
        assert!(!id1.is_legacy());
    }

    #[test]
    fn ulid_generator_embeds_clock_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id = id_gen.generate_task_id().to_string();
        let ulid = Ulid::from_string(&id[TASK_ID_PREFIX.len()..]).expect("valid ulid");

        assert_eq!(ulid.timestamp_ms(), fixed_time.timestamp_millis() as u64);
    }

    #[test]
    fn sequence_generator_counts_up() {
        let id_gen = SequenceIdGenerator::new();
        assert_eq!(id_gen.generate_task_id(), TaskId::from("task-1"));
        assert_eq!(id_gen.generate_task_id(), TaskId::from("task-2"));

        let id_gen = SequenceIdGenerator::starting_at(10);
        assert_eq!(id_gen.generate_task_id(), TaskId::from("task-10"));
    }
}
