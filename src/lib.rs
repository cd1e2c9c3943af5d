//! Devicepulse - liveness and upload-latency telemetry for device fleets.
//!
//! Remote devices report heartbeats and upload durations over HTTP. The
//! service keeps the full history in memory and serves derived statistics:
//! uptime percentage at one-minute granularity and the average upload
//! duration.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       devicepulse                          │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐     ┌─────────────┐     ┌────────────────┐  │
//! │  │  server  │────▶│ DeviceStore │────▶│  core::stats   │  │
//! │  │  (axum)  │     │ (RwLock map)│     │ (pure compute) │  │
//! │  └──────────┘     └─────────────┘     └────────────────┘  │
//! │       │                  ▲                                 │
//! │       ▼                  │                                 │
//! │  ┌──────────┐      ┌──────────┐                            │
//! │  │ validate │      │  loader  │                            │
//! │  │ (sent_at)│      │(CSV list)│                            │
//! │  └──────────┘      └──────────┘                            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is the only shared mutable state; statistics are pure
//! functions over point-in-time snapshots, so a computation never observes
//! a half-applied write.
//!
//! # Example
//!
//! ```no_run
//! use devicepulse::store::DeviceStore;
//! use devicepulse::server::{run, ServerConfig};
//! use devicepulse::validate::TimestampPolicy;
//! use std::sync::Arc;
//!
//! # async fn start() -> anyhow::Result<()> {
//! let store = Arc::new(DeviceStore::new());
//! store.ensure("camera-042");
//!
//! let config = ServerConfig::new("127.0.0.1", 8080, TimestampPolicy::default());
//! let (addr, shutdown) = run(config, store).await?;
//! # let _ = (addr, shutdown);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod loader;
pub mod server;
pub mod store;
pub mod validate;

// Re-export key types at crate root for convenience
pub use config::Config;
pub use self::core::{average_upload, format_ns, round2, uptime_percent, UploadAverage};
pub use loader::{load_devices, LoadSummary};
pub use server::{run, ServerConfig};
pub use store::{DeviceSnapshot, DeviceStore, StoreError};
pub use validate::{parse_rfc3339, parse_sent_at, TimestampError, TimestampPolicy};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
