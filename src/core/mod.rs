//! Pure computation over device telemetry.
//!
//! This module contains:
//! - Uptime and upload statistics over snapshot data
//! - Duration rendering for human-readable output

pub mod duration_fmt;
pub mod stats;

// Re-export commonly used items
pub use duration_fmt::format_ns;
pub use stats::{
    average_upload, minute_span, round2, unique_minute_count, uptime_percent, UploadAverage,
};
