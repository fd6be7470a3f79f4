//! Snapshot construction and the telemetry wire types.
//!
//! A [`SnapshotBuilder`] turns one [`SensorView`](crate::sensors::SensorView)
//! plus one [`ComputeInfo`](data::ComputeInfo) into a [`TelemetrySnapshot`].
//! Numeric fields are rounded to the precision the wire format promises.

pub mod builder;
pub mod data;
pub mod lidar;

pub use builder::{normalize_battery_ratio, round_to, SnapshotBuilder};
pub use data::{ComputeInfo, DiskType, TelemetrySnapshot};
pub use lidar::{LidarSummary, ScanError};
