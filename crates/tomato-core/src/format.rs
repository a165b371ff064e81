//! Human-readable renderings of remaining time and phase durations.

const MINUTE_S: u64 = 60;
const HOUR_S: u64 = 60 * MINUTE_S;
const DAY_S: u64 = 24 * HOUR_S;
const WEEK_S: u64 = 7 * DAY_S;
const MONTH_S: u64 = 30 * DAY_S;

const UNITS: [(u64, &str); 6] = [
    (MONTH_S, "month"),
    (WEEK_S, "week"),
    (DAY_S, "day"),
    (HOUR_S, "hour"),
    (MINUTE_S, "minute"),
    (1, "second"),
];

/// Render `remaining` seconds as `m:ss`.
///
/// Negative values display as `0:00`. Minutes are not wrapped into hours.
pub fn format_clock(remaining: i64) -> String {
    let remaining = remaining.max(0);
    format!("{}:{:02}", remaining / 60, remaining % 60)
}

/// Describe a duration using its largest non-zero unit, e.g. `"25 minutes"`.
pub fn prettify_duration(seconds: u64) -> String {
    let mut rest = seconds;
    for (unit, name) in UNITS {
        let count = rest / unit;
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{count} {name}{plural}");
        }
        rest %= unit;
    }
    "0 seconds".to_string()
}
