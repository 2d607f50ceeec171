use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fractional seconds from `start` to `end`; negative if `end` is earlier.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}

/// Whole seconds from `start` to `end`, truncated and saturated to `i32`.
pub fn whole_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    let secs = (end - start).num_seconds();
    secs.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
