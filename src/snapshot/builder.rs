//! Fuses the sensor view and compute probe output into one snapshot.

use super::data::*;
use super::lidar::LidarSummary;
use crate::sensors::SensorView;
use tracing::debug;

/// Normalize a raw battery charge value to a ratio in `[0, 1]`.
///
/// Values up to `1.0` are taken as a fraction already; anything larger is
/// read as a 0-100 percentage. Out-of-range and non-finite values clamp.
pub fn normalize_battery_ratio(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let ratio = if raw <= 1.0 { raw } else { raw / 100.0 };
    ratio.clamp(0.0, 1.0)
}

/// Round `value` to `places` decimal places, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Builds one [`TelemetrySnapshot`] per tick.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    robot_name: String,
    battery_capacity_wh: f64,
}

impl SnapshotBuilder {
    /// Create a builder for the given robot and battery capacity.
    pub fn new(robot_name: impl Into<String>, battery_capacity_wh: f64) -> Self {
        Self {
            robot_name: robot_name.into(),
            battery_capacity_wh,
        }
    }

    pub fn robot_name(&self) -> &str {
        &self.robot_name
    }

    pub fn battery_capacity_wh(&self) -> f64 {
        self.battery_capacity_wh
    }

    /// Build a snapshot stamped with the current wall-clock time.
    pub fn build(&self, view: &SensorView, compute: ComputeInfo) -> TelemetrySnapshot {
        let ts = chrono::Utc::now()
            .timestamp_nanos_opt()
            .and_then(|ns| u64::try_from(ns).ok())
            .unwrap_or_default();
        self.build_at(ts, view, compute)
    }

    /// Build a snapshot with an explicit timestamp in nanoseconds.
    pub fn build_at(&self, ts: u64, view: &SensorView, compute: ComputeInfo) -> TelemetrySnapshot {
        TelemetrySnapshot {
            ts,
            bot: self.robot_name.clone(),
            kind: SNAPSHOT_TYPE.to_string(),
            battery: self.battery(view),
            pose: pose(view),
            motion: motion(view),
            env: environment(view),
            compute: round_compute(compute),
        }
    }

    fn battery(&self, view: &SensorView) -> BatteryInfo {
        let Some(reading) = view.battery else {
            return BatteryInfo::default();
        };

        let ratio = normalize_battery_ratio(reading.percentage);
        BatteryInfo {
            percentage_ratio: round_to(ratio, 4),
            voltage: round_to(reading.voltage, 2),
            energy_wh: round_to(ratio * self.battery_capacity_wh, 2),
        }
    }
}

fn pose(view: &SensorView) -> PoseInfo {
    view.pose
        .map(|p| PoseInfo {
            x: round_to(p.x, 3),
            y: round_to(p.y, 3),
        })
        .unwrap_or_default()
}

// Velocities and acceleration come from different sensors and are never
// reconciled against each other.
fn motion(view: &SensorView) -> MotionInfo {
    let (linear, angular) = view
        .odometry
        .map(|o| (o.linear_velocity_x, o.angular_velocity_z))
        .unwrap_or((0.0, 0.0));
    let accel = view.imu.map(|i| i.linear_accel_x).unwrap_or(0.0);

    MotionInfo {
        linear_velocity: round_to(linear, 3),
        angular_velocity: round_to(angular, 3),
        acceleration_x: round_to(accel, 3),
    }
}

fn environment(view: &SensorView) -> EnvironmentInfo {
    let summary = match &view.scan {
        Some(scan) => LidarSummary::from_ranges(&scan.ranges).unwrap_or_else(|err| {
            debug!("Discarding lidar summary for this cycle: {}", err);
            LidarSummary::unknown()
        }),
        None => LidarSummary::unknown(),
    };

    EnvironmentInfo {
        obstacle_min_distance: round_to(summary.min_distance, 3),
        obstacle_front_distance: round_to(summary.front_distance, 3),
    }
}

fn round_compute(mut compute: ComputeInfo) -> ComputeInfo {
    compute.cpu.frequency_mhz = round_to(compute.cpu.frequency_mhz, 2);
    compute.cpu.usage_percent = round_to(compute.cpu.usage_percent, 2);
    compute.memory.usage_percent = round_to(compute.memory.usage_percent, 2);
    compute.disk.usage_percent = round_to(compute.disk.usage_percent, 2);
    compute.gpu.memory_usage_percent = round_to(compute.gpu.memory_usage_percent, 2);
    compute.gpu.utilization_percent = round_to(compute.gpu.utilization_percent, 2);
    compute.npu.utilization_percent = round_to(compute.npu.utilization_percent, 2);
    compute
}
