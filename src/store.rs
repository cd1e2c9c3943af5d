//! Concurrency-safe in-memory registry of device telemetry.
//!
//! `DeviceStore` owns the mapping from device id to recorded history. A
//! single coarse read-write lock serializes registry mutation and appends;
//! snapshots clone both sequences under the read lock, so a reader always
//! sees an exact prefix of each sequence and never a torn append. Lock hold
//! times stay O(append) / O(clone) - there is no blocking work inside.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Recorded history for one device.
#[derive(Debug, Clone, Default)]
struct DeviceRecord {
    /// Heartbeat instants in arrival order. Not necessarily sorted -
    /// devices may deliver out of order.
    heartbeats: Vec<DateTime<Utc>>,
    /// Upload durations in nanoseconds, in arrival order.
    upload_samples: Vec<i64>,
}

/// Point-in-time, immutable copy of a device's history.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub heartbeats: Vec<DateTime<Utc>>,
    pub upload_samples: Vec<i64>,
}

impl DeviceSnapshot {
    /// True when the device has no recorded telemetry at all.
    pub fn is_empty(&self) -> bool {
        self.heartbeats.is_empty() && self.upload_samples.is_empty()
    }
}

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("device not found: {0}")]
    NotFound(String),
}

/// In-memory device registry.
///
/// Write paths auto-create unknown devices; only reads report
/// [`StoreError::NotFound`]. Once inserted, a record is never removed or
/// replaced, only appended to.
#[derive(Debug, Default)]
pub struct DeviceStore {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl DeviceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently register a device. Returns true when the record was
    /// newly created.
    pub fn ensure(&self, id: &str) -> bool {
        let mut devices = self.devices.write();
        if devices.contains_key(id) {
            return false;
        }
        devices.insert(id.to_string(), DeviceRecord::default());
        true
    }

    /// Append a heartbeat instant (already normalized to UTC).
    pub fn record_heartbeat(&self, id: &str, at: DateTime<Utc>) {
        let mut devices = self.devices.write();
        devices
            .entry(id.to_string())
            .or_default()
            .heartbeats
            .push(at);
    }

    /// Append an upload-duration sample in nanoseconds.
    pub fn record_upload(&self, id: &str, duration_ns: i64) {
        let mut devices = self.devices.write();
        devices
            .entry(id.to_string())
            .or_default()
            .upload_samples
            .push(duration_ns);
    }

    /// Owned copy of the device's history as of a single instant.
    pub fn snapshot(&self, id: &str) -> Result<DeviceSnapshot, StoreError> {
        let devices = self.devices.read();
        let record = devices
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(DeviceSnapshot {
            heartbeats: record.heartbeats.clone(),
            upload_samples: record.upload_samples.clone(),
        })
    }

    /// Number of registered devices.
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }
}
