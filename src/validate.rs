//! Timestamp parsing and sanity checks shared by the write paths.
//!
//! Inbound `sent_at` values must parse as RFC 3339 with an offset and are
//! normalized to UTC for storage. An optional policy rejects instants far
//! enough from the server clock to pollute the uptime window.

use chrono::{DateTime, Duration, Utc};

/// Timestamp rejections. All of them map to bad-input at the HTTP boundary;
/// none are silently dropped.
#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    #[error("invalid sent_at format: {0}")]
    Parse(String),
    #[error("timestamp too old (>{0}h)")]
    TooOld(i64),
    #[error("timestamp too far in future (>{0}min)")]
    TooFarInFuture(i64),
}

/// Sanity bounds applied to inbound timestamps.
///
/// Guards the uptime window against corrupted device clocks. The rule is
/// explicit and can be disabled wholesale (`DEVICEPULSE_TIMESTAMP_POLICY=off`
/// or `--no-timestamp-policy`).
#[derive(Debug, Clone, Copy)]
pub struct TimestampPolicy {
    pub enabled: bool,
    /// Reject instants more than this many hours in the past.
    pub max_age_hours: i64,
    /// Reject instants more than this many minutes in the future.
    pub max_future_minutes: i64,
}

impl Default for TimestampPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_hours: 24,
            max_future_minutes: 5,
        }
    }
}

impl TimestampPolicy {
    /// A policy that accepts every parseable instant.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Check a parsed instant against the policy bounds.
    pub fn check(&self, t: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), TimestampError> {
        if !self.enabled {
            return Ok(());
        }
        if now - t > Duration::hours(self.max_age_hours) {
            return Err(TimestampError::TooOld(self.max_age_hours));
        }
        if t - now > Duration::minutes(self.max_future_minutes) {
            return Err(TimestampError::TooFarInFuture(self.max_future_minutes));
        }
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp and normalize it to UTC.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| TimestampError::Parse(value.to_string()))
}

/// Parse and policy-check an inbound `sent_at` value.
///
/// `now` is passed in rather than read from the clock so the check is
/// deterministic under test.
pub fn parse_sent_at(
    value: &str,
    policy: &TimestampPolicy,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, TimestampError> {
    let t = parse_rfc3339(value)?;
    policy.check(t, now)?;
    Ok(t)
}
