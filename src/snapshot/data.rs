//! Data structures for the telemetry wire format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message type tag carried by every snapshot.
pub const SNAPSHOT_TYPE: &str = "telemetry";

/// One fused telemetry record, produced once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Wall-clock time the snapshot was built (Unix timestamp in nanoseconds)
    pub ts: u64,
    /// Robot identifier
    pub bot: String,
    /// Message type, always [`SNAPSHOT_TYPE`]
    #[serde(rename = "type")]
    pub kind: String,
    pub battery: BatteryInfo,
    pub pose: PoseInfo,
    pub motion: MotionInfo,
    pub env: EnvironmentInfo,
    pub compute: ComputeInfo,
}

/// Normalized battery state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// Charge level as a ratio in `[0, 1]`
    #[serde(rename = "percentage")]
    pub percentage_ratio: f64,
    /// Pack voltage in volts
    pub voltage: f64,
    /// Remaining energy in watt-hours
    #[serde(rename = "wh")]
    pub energy_wh: f64,
}

/// Robot position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseInfo {
    pub x: f64,
    pub y: f64,
}

/// Robot motion state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionInfo {
    pub linear_velocity: f64,
    pub angular_velocity: f64,
    pub acceleration_x: f64,
}

/// Obstacle distances derived from the lidar scan, `-1.0` when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    #[serde(rename = "obstacle_min")]
    pub obstacle_min_distance: f64,
    #[serde(rename = "obstacle_front")]
    pub obstacle_front_distance: f64,
}

/// Host compute resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub gpu: GpuInfo,
    pub npu: NpuInfo,
}

/// CPU information and usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Number of logical cores
    pub cores: u32,
    /// CPU model name
    pub model: String,
    /// CPU architecture (e.g., "aarch64")
    pub architecture: String,
    /// Current CPU frequency in MHz
    pub frequency_mhz: f64,
    /// CPU usage percentage (0.0 to 100.0)
    pub usage_percent: f64,
}

/// Memory usage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    /// Memory usage percentage (0.0 to 100.0)
    pub usage_percent: f64,
}

/// Root filesystem usage and media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    #[serde(rename = "type")]
    pub disk_type: DiskType,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub usage_percent: f64,
}

/// Storage media classification of the root device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskType {
    #[serde(rename = "SD/eMMC")]
    SdEmmc,
    #[serde(rename = "NVMe SSD")]
    NvmeSsd,
    #[serde(rename = "HDD")]
    Hdd,
    #[serde(rename = "SSD")]
    Ssd,
    #[default]
    Unknown,
}

impl DiskType {
    pub fn label(&self) -> &'static str {
        match self {
            DiskType::SdEmmc => "SD/eMMC",
            DiskType::NvmeSsd => "NVMe SSD",
            DiskType::Hdd => "HDD",
            DiskType::Ssd => "SSD",
            DiskType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// GPU information; all fields zeroed when no GPU is reachable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub available: bool,
    pub name: Option<String>,
    pub model: Option<String>,
    pub memory_total_bytes: u64,
    pub memory_used_bytes: u64,
    pub memory_usage_percent: f64,
    pub utilization_percent: f64,
}

/// Neural accelerator information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpuInfo {
    pub available: bool,
    pub name: Option<String>,
    pub model: Option<String>,
    pub utilization_percent: f64,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            obstacle_min_distance: -1.0,
            obstacle_front_distance: -1.0,
        }
    }
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self {
            cores: 0,
            model: "Unknown".to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            frequency_mhz: 0.0,
            usage_percent: 0.0,
        }
    }
}

impl GpuInfo {
    /// The result reported when no GPU can be queried.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl NpuInfo {
    /// The result reported when no accelerator is detected.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub(crate) fn detected(name: &str, model: &str, utilization_percent: f64) -> Self {
        Self {
            available: true,
            name: Some(name.to_string()),
            model: Some(model.to_string()),
            utilization_percent,
        }
    }
}

impl TelemetrySnapshot {
    /// Multi-line operator summary of this snapshot.
    pub fn report(&self) -> String {
        let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
        format!(
            "\n--- [{}] Telemetry Report ---\n \
             [Power]   Batt: {}% ({:.2}V)\n \
             [Pose]    (x={:.2}, y={:.2})\n \
             [Motion]  Linear: {:.2} m/s | Angular: {:.2} rad/s | Accel X: {:.2}\n \
             [Lidar]   Front: {:.2}m | Min(Risk): {:.2}m\n \
             [Compute] CPU: {:.1}% | Mem: {:.1}% | Disk: {:.1}% ({})\n \
             [Accel]   GPU: {} | NPU: {}\n\
             ----------------------------------------",
            self.bot,
            (self.battery.percentage_ratio * 100.0).round() as i64,
            self.battery.voltage,
            self.pose.x,
            self.pose.y,
            self.motion.linear_velocity,
            self.motion.angular_velocity,
            self.motion.acceleration_x,
            self.env.obstacle_front_distance,
            self.env.obstacle_min_distance,
            self.compute.cpu.usage_percent,
            self.compute.memory.usage_percent,
            self.compute.disk.usage_percent,
            self.compute.disk.disk_type,
            yes_no(self.compute.gpu.available),
            yes_no(self.compute.npu.available),
        )
    }
}
