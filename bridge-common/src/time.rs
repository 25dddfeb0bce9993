//! Timestamp utilities

use chrono::{DateTime, TimeZone, Utc};

/// Convert a UTC timestamp to Unix epoch milliseconds
///
/// ClickUp date fields and task timestamps are exchanged in this form.
pub fn to_unix_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Convert Unix epoch milliseconds back to a UTC timestamp
///
/// Returns `None` for values outside chrono's representable range.
pub fn from_unix_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
