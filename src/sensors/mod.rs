//! Sensor inputs: reading types, the latest-value cache and input sources.
//!
//! Each channel (battery, pose, imu, scan, odometry) only ever holds its most
//! recent reading. Sources push [`SensorEvent`]s into the agent, which applies
//! them to the [`SensorStateCache`] one at a time.

pub mod cache;
pub mod readings;
pub mod source;

pub use cache::{SensorStateCache, SensorView};
pub use readings::{
    BatteryReading, Channel, ImuReading, OdometryReading, PoseReading, ScanReading, SensorEvent,
};
