pub mod admin;
pub mod balances;
pub mod health;
pub mod withdrawals;

use chrono::{DateTime, SecondsFormat, Utc};

pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-03-01T00:00:00.000Z`.
pub fn iso8601(unix_seconds: u64) -> String {
    let secs = i64::try_from(unix_seconds).unwrap_or(i64::MAX);
    DateTime::from_timestamp(secs, 0)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
