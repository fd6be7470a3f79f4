//! End-to-end tests of the cache -> builder -> publisher pipeline.

use robot_telemetry::sensors::{
    BatteryReading, ImuReading, OdometryReading, PoseReading, ScanReading,
};
use robot_telemetry::snapshot::data::*;
use robot_telemetry::{
    AgentConfig, ComputeProbe, DeliveryChannel, HardwareProbe, NullGpuProbe, PublishOutcome,
    Result, SensorEvent, SensorStateCache, SnapshotBuilder, TelemetryAgent, TelemetryError,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Delivery channel that keeps every message in memory.
#[derive(Clone, Default)]
struct RecordingChannel {
    messages: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl RecordingChannel {
    fn snapshots(&self) -> Vec<serde_json::Value> {
        self.messages
            .borrow()
            .iter()
            .map(|body| serde_json::from_slice(body).expect("published body should be JSON"))
            .collect()
    }
}

impl DeliveryChannel for RecordingChannel {
    async fn deliver(&self, body: Vec<u8>) -> Result<()> {
        self.messages.borrow_mut().push(body);
        Ok(())
    }
}

/// Delivery channel whose broker is always gone.
struct BrokenChannel;

impl DeliveryChannel for BrokenChannel {
    async fn deliver(&self, _body: Vec<u8>) -> Result<()> {
        Err(TelemetryError::publish_error("connection reset by peer"))
    }
}

/// Compute probe returning a fixed block.
struct FixedCompute(ComputeInfo);

impl ComputeProbe for FixedCompute {
    fn probe(&mut self) -> ComputeInfo {
        self.0.clone()
    }
}

fn builder() -> SnapshotBuilder {
    SnapshotBuilder::new("burger01", 19.98)
}

fn battery(percentage: f64, voltage: f64) -> SensorEvent {
    SensorEvent::Battery(BatteryReading {
        percentage,
        voltage,
    })
}

#[test]
fn test_scenario_battery_ratio() {
    let mut cache = SensorStateCache::new();
    cache.update(battery(0.73, 16.1));

    let snapshot = builder().build_at(1, &cache.snapshot_view(), ComputeInfo::default());
    assert_eq!(snapshot.battery.percentage_ratio, 0.73);
    assert_eq!(snapshot.battery.voltage, 16.1);
    // 0.73 * 19.98 = 14.5854
    assert_eq!(snapshot.battery.energy_wh, 14.59);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["battery"]["percentage"], 0.73);
    assert_eq!(json["battery"]["voltage"], 16.1);
    assert_eq!(json["battery"]["wh"], 14.59);
}

#[test]
fn test_scenario_battery_percentage() {
    let mut cache = SensorStateCache::new();
    let event: SensorEvent =
        serde_json::from_str(r#"{"channel":"battery","percentage":73}"#).unwrap();
    cache.update(event);

    let snapshot = builder().build_at(1, &cache.snapshot_view(), ComputeInfo::default());
    assert_eq!(snapshot.battery.percentage_ratio, 0.73);
    assert_eq!(snapshot.battery.energy_wh, 14.59);
}

#[test]
fn test_scenario_front_cone() {
    let ranges: Vec<f64> = (0..25)
        .map(|i| if i < 10 || i >= 15 { 2.0 } else { 0.0 })
        .collect();
    let mut cache = SensorStateCache::new();
    cache.update(SensorEvent::Scan(ScanReading { ranges }));

    let snapshot = builder().build_at(1, &cache.snapshot_view(), ComputeInfo::default());
    assert_eq!(snapshot.env.obstacle_front_distance, 2.0);
    assert_eq!(snapshot.env.obstacle_min_distance, 2.0);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["env"]["obstacle_front"], 2.0);
    assert_eq!(json["env"]["obstacle_min"], 2.0);
}

#[test]
fn test_scenario_no_accelerators() {
    let host_root = tempfile::tempdir().unwrap();
    let mut probe = HardwareProbe::new(Box::new(NullGpuProbe)).with_host_root(host_root.path());

    let snapshot = builder().build_at(1, &SensorStateCache::new().snapshot_view(), probe.probe());
    let compute = &snapshot.compute;
    assert!(!compute.gpu.available);
    assert!(!compute.npu.available);
    assert!(compute.cpu.cores > 0);
    assert!(!compute.cpu.architecture.is_empty());
    assert!(compute.memory.total_bytes > 0);
    assert!(compute.memory.used_bytes <= compute.memory.total_bytes);
}

#[test]
fn test_all_channels_absent() {
    let snapshot = builder().build_at(42, &SensorStateCache::new().snapshot_view(), ComputeInfo::default());

    assert_eq!(snapshot.ts, 42);
    assert_eq!(snapshot.battery, BatteryInfo::default());
    assert_eq!(snapshot.battery.energy_wh, 0.0);
    assert_eq!(snapshot.pose, PoseInfo { x: 0.0, y: 0.0 });
    assert_eq!(snapshot.motion, MotionInfo::default());
    assert_eq!(snapshot.env.obstacle_min_distance, -1.0);
    assert_eq!(snapshot.env.obstacle_front_distance, -1.0);
}

#[test]
fn test_wire_format_fields() {
    let mut cache = SensorStateCache::new();
    cache.update(battery(0.5, 12.346));
    cache.update(SensorEvent::Pose(PoseReading {
        x: 1.23456,
        y: 2.0004,
    }));
    cache.update(SensorEvent::Odometry(OdometryReading {
        linear_velocity_x: 0.26,
        angular_velocity_z: 1.8234,
    }));
    cache.update(SensorEvent::Imu(ImuReading {
        linear_accel_x: 9.80665,
    }));

    let snapshot = builder().build_at(7, &cache.snapshot_view(), ComputeInfo::default());
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["ts"], 7);
    assert_eq!(json["bot"], "burger01");
    assert_eq!(json["type"], "telemetry");
    assert_eq!(json["battery"]["voltage"], 12.35);
    assert_eq!(json["pose"]["x"], 1.235);
    assert_eq!(json["pose"]["y"], 2.0);
    assert_eq!(json["motion"]["angular_velocity"], 1.823);
    assert_eq!(json["motion"]["acceleration_x"], 9.807);
    assert_eq!(json["compute"]["disk"]["type"], "Unknown");
    assert!(json["compute"]["gpu"]["name"].is_null());
    for key in ["total_bytes", "available_bytes", "used_bytes", "usage_percent"] {
        assert!(json["compute"]["memory"].get(key).is_some(), "missing memory.{}", key);
    }
}

#[tokio::test]
async fn test_tick_publishes_snapshot() {
    let channel = RecordingChannel::default();
    let config = AgentConfig::new("burger01");
    let mut agent = TelemetryAgent::new(config, FixedCompute(ComputeInfo::default()), channel.clone());

    agent.handle_event(battery(80.0, 12.1));
    let (snapshot, outcome) = agent.tick().await;

    assert_eq!(outcome, PublishOutcome::Delivered);
    assert_eq!(snapshot.battery.percentage_ratio, 0.8);

    let published = channel.snapshots();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["battery"]["percentage"], 0.8);
    assert_eq!(published[0]["bot"], "burger01");
}

#[tokio::test]
async fn test_publish_failure_is_not_fatal() {
    let mut agent = TelemetryAgent::new(
        AgentConfig::new("burger01"),
        FixedCompute(ComputeInfo::default()),
        BrokenChannel,
    );

    let (_, first) = agent.tick().await;
    let (_, second) = agent.tick().await;

    assert_eq!(first, PublishOutcome::Dropped);
    assert_eq!(second, PublishOutcome::Dropped);
    let stats = agent.stats();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.delivered, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_ticks_on_schedule() {
    let channel = RecordingChannel::default();
    let config = AgentConfig::new("burger01").with_tick_interval_secs(5);
    let mut agent = TelemetryAgent::new(config, FixedCompute(ComputeInfo::default()), channel.clone());

    let (tx, rx) = mpsc::channel(8);
    tx.send(battery(0.25, 11.0)).await.unwrap();
    tx.send(battery(0.5, 11.5)).await.unwrap();
    drop(tx);

    let stats = agent.run(rx, tokio::time::sleep(Duration::from_secs(11))).await;

    assert_eq!(stats.events, 2);
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.delivered, 2);

    // Only the latest battery reading is reported, and ticking continued after
    // the event source closed.
    let published = channel.snapshots();
    assert_eq!(published.len(), 2);
    assert!(published.iter().all(|s| s["battery"]["percentage"] == 0.5));
}

#[tokio::test(start_paused = true)]
async fn test_run_without_any_sensor_data() {
    let channel = RecordingChannel::default();
    let config = AgentConfig::new("burger01").with_tick_interval_secs(1);
    let mut agent = TelemetryAgent::new(config, FixedCompute(ComputeInfo::default()), channel.clone());

    let (_tx, rx) = mpsc::channel::<SensorEvent>(1);
    let stats = agent.run(rx, tokio::time::sleep(Duration::from_millis(3500))).await;

    assert_eq!(stats.ticks, 3);
    for snapshot in channel.snapshots() {
        assert_eq!(snapshot["env"]["obstacle_min"], -1.0);
        assert_eq!(snapshot["battery"]["wh"], 0.0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_with_zero_interval_ticks_every_second() {
    let channel = RecordingChannel::default();
    let config = AgentConfig::new("burger01").with_tick_interval_secs(0);
    let mut agent = TelemetryAgent::new(config, FixedCompute(ComputeInfo::default()), channel.clone());

    let (_tx, rx) = mpsc::channel::<SensorEvent>(1);
    let stats = agent.run(rx, tokio::time::sleep(Duration::from_millis(2500))).await;

    assert_eq!(stats.ticks, 2);
    assert_eq!(channel.snapshots().len(), 2);
}
