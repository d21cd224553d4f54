//! Task identifiers.
//!
//! # 形式
//! 新しく作るタスクは必ず文字列 ID（`task-<ULID>`）を持ちます。
//! 古いデータには連番の数値 ID（`0`, `1`, ...）が残っているため、
//! `TaskId` は数値と文字列のタグ付き共用体として表現します。
//!
//! ## 比較ルール（`TaskId::matches`、左が保存済みの ID、右が検索キー）
//! - 同じ種類同士: 通常の等価比較
//! - 保存済みが数値で検索キーが文字列: キーの最初の数字列を取り出して数値比較
//!   （例: 保存済みの `Numeric(7)` は `Text("task-7")` で引ける）
//! - 保存済みが文字列で検索キーが数値: マッチしない。`task-<ULID>` の
//!   ULID は `01` で始まるので、`1` が新しい ID すべてに当たってしまう
//!
//! これは旧データとの互換のためだけの規則です。新しい ID の形式として
//! 推奨するものではありません。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a task record, unique within one date's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    /// Legacy sequential id.
    Numeric(u64),
    /// Current string id.
    Text(String),
}

impl TaskId {
    /// Interpret user input: all-digit strings become legacy numeric ids.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<u64>() {
            Ok(n) if trimmed.bytes().all(|b| b.is_ascii_digit()) => TaskId::Numeric(n),
            _ => TaskId::Text(trimmed.to_string()),
        }
    }

    /// Does this stored id answer to `query`? Only stored legacy ids
    /// fall back to digit matching.
    pub fn matches(&self, query: &TaskId) -> bool {
        match (self, query) {
            (TaskId::Numeric(a), TaskId::Numeric(b)) => a == b,
            (TaskId::Text(a), TaskId::Text(b)) => a == b,
            (TaskId::Numeric(n), TaskId::Text(s)) => first_number(s) == Some(*n),
            (TaskId::Text(_), TaskId::Numeric(_)) => false,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, TaskId::Numeric(_))
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        TaskId::Text(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId::Text(value.to_string())
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        TaskId::Numeric(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Numeric(n) => write!(f, "{n}"),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

/// Position of `id` in `ids`: exact match first, legacy match as fallback.
pub fn position_of<'a, I>(ids: I, id: &TaskId) -> Option<usize>
where
    I: IntoIterator<Item = &'a TaskId>,
    I::IntoIter: Clone,
{
    let iter = ids.into_iter();
    iter.clone()
        .position(|candidate| candidate == id)
        .or_else(|| iter.clone().position(|candidate| candidate.matches(id)))
}

/// First run of ASCII digits in `s`, parsed as u64.
fn first_number(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_uses_plain_equality() {
        assert!(TaskId::from("task-7").matches(&TaskId::from("task-7")));
        assert!(!TaskId::from("task-7").matches(&TaskId::from("task-8")));
        assert!(TaskId::Numeric(3).matches(&TaskId::Numeric(3)));
    }

    #[test]
    fn stored_numeric_matches_first_number_in_query() {
        assert!(TaskId::Numeric(7).matches(&TaskId::from("task-7")));
        assert!(TaskId::Numeric(12).matches(&TaskId::from("x12y34")));
        assert!(!TaskId::Numeric(34).matches(&TaskId::from("x12y34")));
        assert!(!TaskId::Numeric(0).matches(&TaskId::from("task-abc")));
    }

    #[test]
    fn numeric_query_never_matches_text_ids() {
        assert!(!TaskId::from("task-7").matches(&TaskId::Numeric(7)));
        assert!(!TaskId::from("task-01JP99G9W06K2JS2W1QHG3RPX1").matches(&TaskId::Numeric(1)));

        let ids = [
            TaskId::from("task-01JP99G9W06K2JS2W1QHG3RPX1"),
            TaskId::from("task-01JP99G9W0MHQ8QRCN8TPMZ0D1"),
        ];
        assert_eq!(position_of(&ids, &TaskId::parse("1")), None);
    }

    #[test]
    fn parse_distinguishes_legacy_ids() {
        assert_eq!(TaskId::parse("42"), TaskId::Numeric(42));
        assert_eq!(TaskId::parse(" task-42 "), TaskId::from("task-42"));
        assert_eq!(TaskId::parse("-1"), TaskId::from("-1"));
    }

    #[test]
    fn exact_match_wins_over_legacy_match() {
        let ids = [TaskId::Numeric(1), TaskId::from("task-1")];
        assert_eq!(position_of(&ids, &TaskId::from("task-1")), Some(1));
        assert_eq!(position_of(&ids[..1], &TaskId::from("task-1")), Some(0));
        assert_eq!(position_of(&ids, &TaskId::from("task-9")), None);
    }

    #[test]
    fn serializes_untagged() {
        let numeric = serde_json::to_string(&TaskId::Numeric(5)).unwrap();
        let text = serde_json::to_string(&TaskId::from("task-5")).unwrap();
        assert_eq!(numeric, "5");
        assert_eq!(text, "\"task-5\"");

        let back: TaskId = serde_json::from_str("5").unwrap();
        assert_eq!(back, TaskId::Numeric(5));
    }
}
