//! Latest-value cache for the sensor channels.

use super::readings::{
    BatteryReading, Channel, ImuReading, OdometryReading, PoseReading, ScanReading, SensorEvent,
};

/// Holds the most recent reading of every channel.
///
/// Slots start empty and stay empty until their first update; a channel with
/// no publisher is a normal, permanent state. Updates overwrite the slot
/// wholesale and never merge with the previous reading.
#[derive(Debug, Default)]
pub struct SensorStateCache {
    battery: Option<BatteryReading>,
    pose: Option<PoseReading>,
    imu: Option<ImuReading>,
    scan: Option<ScanReading>,
    odometry: Option<OdometryReading>,
}

/// A point-in-time copy of every cache slot.
///
/// Each slot reflects its own latest update; slots written at different times
/// are not guaranteed to be mutually consistent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorView {
    pub battery: Option<BatteryReading>,
    pub pose: Option<PoseReading>,
    pub imu: Option<ImuReading>,
    pub scan: Option<ScanReading>,
    pub odometry: Option<OdometryReading>,
}

impl SensorStateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot of the event's channel.
    pub fn update(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Battery(reading) => self.battery = Some(reading),
            SensorEvent::Pose(reading) => self.pose = Some(reading),
            SensorEvent::Imu(reading) => self.imu = Some(reading),
            SensorEvent::Scan(reading) => self.scan = Some(reading),
            SensorEvent::Odometry(reading) => self.odometry = Some(reading),
        }
    }

    /// Copy out the current value of every slot.
    pub fn snapshot_view(&self) -> SensorView {
        SensorView {
            battery: self.battery,
            pose: self.pose,
            imu: self.imu,
            scan: self.scan.clone(),
            odometry: self.odometry,
        }
    }

    /// Whether the given channel has received at least one reading.
    pub fn has(&self, channel: Channel) -> bool {
        match channel {
            Channel::Battery => self.battery.is_some(),
            Channel::Pose => self.pose.is_some(),
            Channel::Imu => self.imu.is_some(),
            Channel::Scan => self.scan.is_some(),
            Channel::Odometry => self.odometry.is_some(),
        }
    }

    /// Channels that have received at least one reading, in report order.
    pub fn populated_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|channel| self.has(*channel))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated_channels().is_empty()
    }
}
