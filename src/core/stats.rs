//! Statistics over a device's recorded history.
//!
//! Everything here is a pure function over snapshot data - no locks, no
//! I/O. The store hands out owned snapshots; the HTTP layer applies
//! presentation rounding on top of the raw values.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::core::duration_fmt::format_ns;

/// Average upload duration for a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAverage {
    /// Truncating integer mean of the samples, in nanoseconds.
    pub nanos: i64,
    /// Human-readable rendering of `nanos` ("5ns", "1.5s", "2m3s").
    pub formatted: String,
    /// False when no samples were recorded. Callers must branch on this
    /// flag, not on the string - "0s" is also a valid zero average.
    pub has_data: bool,
}

/// UTC calendar minute containing the instant (seconds truncated).
fn minute_bucket(t: &DateTime<Utc>) -> i64 {
    t.timestamp().div_euclid(60)
}

/// Count distinct UTC calendar minutes containing at least one heartbeat.
///
/// 10:00:05 and 10:00:55 fall in the same minute. The count is invariant
/// under reordering and duplicate timestamps.
pub fn unique_minute_count(heartbeats: &[DateTime<Utc>]) -> usize {
    heartbeats
        .iter()
        .map(minute_bucket)
        .collect::<HashSet<_>>()
        .len()
}

/// Inclusive minute span between the earliest and latest heartbeat.
///
/// Measured between minute buckets and counting both boundary minutes, so
/// 10:00:59 and 10:01:01 span two minutes. `None` for fewer than two
/// heartbeats - there is no window yet.
pub fn minute_span(heartbeats: &[DateTime<Utc>]) -> Option<i64> {
    if heartbeats.len() < 2 {
        return None;
    }
    let min = heartbeats.iter().map(minute_bucket).min()?;
    let max = heartbeats.iter().map(minute_bucket).max()?;
    Some(max - min + 1)
}

/// Fraction of observed minutes in which the device checked in, 0-100.
///
/// A single occupied minute is full uptime: with no window to be absent
/// from, the device was present for everything observed. Every occupied
/// bucket lies inside the span, so the result never exceeds 100.
pub fn uptime_percent(heartbeats: &[DateTime<Utc>]) -> f64 {
    if heartbeats.is_empty() {
        return 0.0;
    }
    let uniq = unique_minute_count(heartbeats);
    match minute_span(heartbeats) {
        Some(span) if span > 1 => (uniq as f64 / span as f64) * 100.0,
        _ => 100.0,
    }
}

/// Round to two decimal places, half-up. Presentation only - stored and
/// intermediate values stay unrounded.
pub fn round2(value: f64) -> f64 {
    ((value * 100.0) + 0.5).floor() / 100.0
}

/// Truncating integer mean of the recorded samples, rendered for humans.
///
/// An absent or empty history yields `("0s", has_data = false)`, never an
/// error.
pub fn average_upload(samples: &[i64]) -> UploadAverage {
    if samples.is_empty() {
        return UploadAverage {
            nanos: 0,
            formatted: "0s".to_string(),
            has_data: false,
        };
    }
    // i128 accumulator: the sum of i64 samples can exceed i64::MAX.
    let sum: i128 = samples.iter().map(|&v| v as i128).sum();
    let nanos = (sum / samples.len() as i128) as i64;
    UploadAverage {
        nanos,
        formatted: format_ns(nanos),
        has_data: true,
    }
}
