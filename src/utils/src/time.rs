use chrono::format::StrftimeItems;
use chrono::{DateTime, NaiveDateTime};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// unix_nano_to_time converts nanoseconds since the epoch, `None` when chrono can not represent it.
pub fn unix_nano_to_time(unix_nano: i64) -> Option<NaiveDateTime> {
    let secs = unix_nano.div_euclid(NANOS_PER_SEC);
    let nsecs = unix_nano.rem_euclid(NANOS_PER_SEC) as u32;
    DateTime::from_timestamp(secs, nsecs).map(|dt| dt.naive_utc())
}

pub fn time_format(dt: NaiveDateTime) -> String {
    let fmt = StrftimeItems::new("%Y-%m-%dT%H:%M:%S%.9fZ");
    format!("{}", dt.format_with_items(fmt))
}

/// format_unix_nano renders a timestamp for diagnostics, falling back to the raw number.
pub fn format_unix_nano(unix_nano: i64) -> String {
    match unix_nano_to_time(unix_nano) {
        Some(dt) => time_format(dt),
        None => unix_nano.to_string(),
    }
}
