//! Device roster bootstrap from CSV.
//!
//! A one-time load feeds device ids into the store before the server
//! accepts traffic. The first column of each row is the device id; the
//! header row is skipped. Blank or malformed rows are counted and skipped,
//! duplicates are harmless. Only failure to read the file itself is an
//! error - the caller treats that as fatal to startup.

use crate::store::DeviceStore;
use anyhow::Context;
use std::path::Path;

/// Outcome of a roster load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Devices newly registered.
    pub created: usize,
    /// Rows naming an already-registered device.
    pub duplicates: usize,
    /// Blank or malformed rows.
    pub skipped: usize,
}

/// Read device ids from a CSV file and register each in the store.
pub fn load_devices(path: &Path, store: &DeviceStore) -> anyhow::Result<LoadSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading device roster {}", path.display()))?;

    let mut summary = LoadSummary::default();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed roster row");
                summary.skipped += 1;
                continue;
            }
        };

        let id = record.get(0).map(str::trim).unwrap_or_default();
        if id.is_empty() {
            summary.skipped += 1;
            continue;
        }

        if store.ensure(id) {
            summary.created += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    tracing::info!(
        created = summary.created,
        duplicates = summary.duplicates,
        skipped = summary.skipped,
        roster = %path.display(),
        "device roster loaded"
    );
    Ok(summary)
}
