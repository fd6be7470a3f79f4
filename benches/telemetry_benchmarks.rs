use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use robot_telemetry::{
    probe::{ComputeProbe, HardwareProbe, NullGpuProbe},
    sensors::{BatteryReading, OdometryReading, ScanReading},
    snapshot::{LidarSummary, SnapshotBuilder},
    publisher::encode_snapshot,
    SensorEvent, SensorStateCache,
};

fn sweep(len: usize) -> Vec<f64> {
    (0..len).map(|i| 0.2 + (i % 40) as f64 * 0.1).collect()
}

fn populated_cache() -> SensorStateCache {
    let mut cache = SensorStateCache::new();
    cache.update(SensorEvent::Battery(BatteryReading {
        percentage: 73.0,
        voltage: 16.1,
    }));
    cache.update(SensorEvent::Odometry(OdometryReading {
        linear_velocity_x: 0.22,
        angular_velocity_z: 0.1,
    }));
    cache.update(SensorEvent::Scan(ScanReading { ranges: sweep(360) }));
    cache
}

/// Benchmark lidar summaries for common sweep sizes
fn bench_lidar_summary(c: &mut Criterion) {
    for len in [20, 360, 720, 1440].iter() {
        let ranges = sweep(*len);
        c.bench_with_input(BenchmarkId::new("lidar_summary", len), &ranges, |b, ranges| {
            b.iter(|| LidarSummary::from_ranges(ranges))
        });
    }
}

/// Benchmark snapshot construction from a populated cache
fn bench_snapshot_build(c: &mut Criterion) {
    let cache = populated_cache();
    let builder = SnapshotBuilder::new("burger01", 19.98);
    let compute = HardwareProbe::new(Box::new(NullGpuProbe)).probe();

    c.bench_function("snapshot_build", |b| {
        b.iter(|| builder.build(&cache.snapshot_view(), compute.clone()))
    });
}

/// Benchmark a full hardware probe
fn bench_hardware_probe(c: &mut Criterion) {
    let mut probe = HardwareProbe::new(Box::new(NullGpuProbe));

    c.bench_function("hardware_probe", |b| b.iter(|| probe.probe()));
}

/// Benchmark JSON encoding of a snapshot for the wire
fn bench_json_encoding(c: &mut Criterion) {
    let cache = populated_cache();
    let compute = HardwareProbe::new(Box::new(NullGpuProbe)).probe();
    let snapshot = SnapshotBuilder::new("burger01", 19.98).build(&cache.snapshot_view(), compute);

    c.bench_function("json_encoding", |b| {
        b.iter(|| encode_snapshot(&snapshot).expect("Should serialize"))
    });
}

criterion_group!(
    benches,
    bench_lidar_summary,
    bench_snapshot_build,
    bench_hardware_probe,
    bench_json_encoding
);
criterion_main!(benches);
