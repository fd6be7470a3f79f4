//! Reading types for the five sensor channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Battery state as reported by the power driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Raw charge level. Drivers disagree on scale: some report a 0..1
    /// fraction, others a 0..100 percentage.
    pub percentage: f64,
    /// Pack voltage in volts
    #[serde(default)]
    pub voltage: f64,
}

/// Localized robot position in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseReading {
    pub x: f64,
    pub y: f64,
}

/// Inertial measurement, reduced to forward acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuReading {
    /// Linear acceleration along x in m/s²
    pub linear_accel_x: f64,
}

/// One lidar sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReading {
    /// Range samples in metres, ordered by angle starting straight ahead
    pub ranges: Vec<f64>,
}

/// Wheel odometry twist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryReading {
    /// Forward velocity in m/s
    pub linear_velocity_x: f64,
    /// Yaw rate in rad/s
    pub angular_velocity_z: f64,
}

/// Names of the sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Battery,
    Pose,
    Imu,
    Scan,
    Odometry,
}

impl Channel {
    /// All channels in report order.
    pub const ALL: [Channel; 5] = [
        Channel::Battery,
        Channel::Pose,
        Channel::Imu,
        Channel::Scan,
        Channel::Odometry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Battery => "battery",
            Channel::Pose => "pose",
            Channel::Imu => "imu",
            Channel::Scan => "scan",
            Channel::Odometry => "odometry",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reading delivered on one channel.
///
/// On the wire the channel is carried in a `channel` tag next to the reading
/// fields, e.g. `{"channel":"pose","x":1.0,"y":2.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum SensorEvent {
    Battery(BatteryReading),
    Pose(PoseReading),
    Imu(ImuReading),
    Scan(ScanReading),
    Odometry(OdometryReading),
}

impl SensorEvent {
    /// The channel this event updates.
    pub fn channel(&self) -> Channel {
        match self {
            SensorEvent::Battery(_) => Channel::Battery,
            SensorEvent::Pose(_) => Channel::Pose,
            SensorEvent::Imu(_) => Channel::Imu,
            SensorEvent::Scan(_) => Channel::Scan,
            SensorEvent::Odometry(_) => Channel::Odometry,
        }
    }
}
