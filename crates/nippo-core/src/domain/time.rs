//! TimeCodec - 表示用時刻文字列と「その日の何分目か」の相互変換
//!
//! タイムライン上の時刻は `午前 9:00` / `午後 3:05` のような 12 時間表記の
//! 文字列で保存されます。比較や並べ替えはすべて 0..1440 の分に変換して行います。
//!
//! # 受け付ける文法
//! - 24 時間表記: `H:mm` / `HH:mm`（0–23 時, 00–59 分）
//! - 12 時間表記: `午前` または `午後` を含み、`H:mm`（1–12 時）
//!
//! パースできない文字列は `None` になります。呼び出し側は `None` を
//! 「比較できない」として扱い、エラーにはせずスキップします。

/// 午前マーカー
pub const AM_MARKER: &str = "午前";

/// 午後マーカー
pub const PM_MARKER: &str = "午後";

/// 1 日の分数
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// 時刻文字列を分に変換する。
///
/// ```
/// use nippo_core::domain::time::parse_to_minutes;
///
/// assert_eq!(parse_to_minutes("午後 3:05"), Some(15 * 60 + 5));
/// assert_eq!(parse_to_minutes("09:30"), Some(9 * 60 + 30));
/// assert_eq!(parse_to_minutes("午前 12:10"), Some(10));
/// assert_eq!(parse_to_minutes("noon"), None);
/// ```
pub fn parse_to_minutes(display: &str) -> Option<u32> {
    let raw = display.trim();
    if !raw.contains(':') {
        return None;
    }

    if let Some((hour, minute)) = split_hour_minute(raw)
        && hour < 24
    {
        return Some(hour * 60 + minute);
    }

    let has_am = raw.contains(AM_MARKER);
    let has_pm = raw.contains(PM_MARKER);
    if has_am == has_pm {
        // マーカーなし、または両方あり
        return None;
    }

    let time_only = raw.replacen(AM_MARKER, "", 1).replacen(PM_MARKER, "", 1);
    let (hour, minute) = split_hour_minute(time_only.trim())?;
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour = match (has_pm, hour) {
        (true, 12) => 12,
        (true, h) => h + 12,
        (false, 12) => 0,
        (false, h) => h,
    };
    Some(hour * 60 + minute)
}

/// 分を 12 時間表記の表示文字列に変換する。
///
/// 1440 以上の値は 1 日で折り返します。
pub fn format_from_minutes(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hour = minutes / 60;
    let minute = minutes % 60;

    let (marker, hour12) = match hour {
        0 => (AM_MARKER, 12),
        1..=11 => (AM_MARKER, hour),
        12 => (PM_MARKER, 12),
        _ => (PM_MARKER, hour - 12),
    };
    format!("{marker} {hour12}:{minute:02}")
}

/// パースできれば表示形式に正規化した文字列を返す。
pub fn normalize_display(input: &str) -> Option<String> {
    parse_to_minutes(input).map(format_from_minutes)
}

/// 開始〜終了の所要時間（分）。
///
/// 日をまたぐタスクは扱わないので、終了が開始より前なら `None`。
pub fn duration_minutes(start: &str, end: &str) -> Option<u32> {
    let start = parse_to_minutes(start)?;
    let end = parse_to_minutes(end)?;
    end.checked_sub(start)
}

/// 所要時間を `1時間30分` のような表記にする。
pub fn format_duration_ja(total_minutes: u32) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{m}分"),
        (h, 0) => format!("{h}時間"),
        (h, m) => format!("{h}時間{m}分"),
    }
}

/// `H:mm` / `HH:mm` を (時, 分) に分解する。時の範囲チェックは呼び出し側。
fn split_hour_minute(s: &str) -> Option<(u32, u32)> {
    let (hours, minutes) = s.split_once(':')?;
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

    if !all_digits(hours) || hours.len() > 2 || !all_digits(minutes) || minutes.len() != 2 {
        return None;
    }

    let hour: u32 = hours.parse().ok()?;
    let minute: u32 = minutes.parse().ok()?;
    if minute > 59 {
        return None;
    }
    Some((hour, minute))
}
