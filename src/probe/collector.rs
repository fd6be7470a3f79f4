//! Hardware probe built on sysinfo plus direct procfs/sysfs reads.

use super::disk::{classify_disk, read_rotational_flag};
use super::gpu::{select_gpu_probe, GpuProbe};
use super::host::{parse_cpu_model, HostRoot};
use super::npu::{detect_npu, NPU_DETECTION_ORDER};
use super::traits::ComputeProbe;
use super::ProbeError;
use crate::snapshot::data::*;
use std::path::Path;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

/// Probes CPU, memory, disk, GPU and NPU state on every call.
pub struct HardwareProbe {
    system: System,
    disks: Disks,
    gpu: Box<dyn GpuProbe>,
    root: HostRoot,
}

fn refresh_kind() -> RefreshKind {
    RefreshKind::new()
        .with_cpu(CpuRefreshKind::everything())
        .with_memory(MemoryRefreshKind::everything())
}

impl HardwareProbe {
    /// Create a probe with an explicit GPU backend.
    pub fn new(gpu: Box<dyn GpuProbe>) -> Self {
        // The first usage sample is always zero; take it now so the first
        // tick reports a real figure.
        let system = System::new_with_specifics(refresh_kind());
        let disks = Disks::new_with_refreshed_list();

        Self {
            system,
            disks,
            gpu,
            root: HostRoot::default(),
        }
    }

    /// Create a probe, selecting the GPU backend available on this host.
    pub fn detect() -> Self {
        Self::new(select_gpu_probe())
    }

    /// Resolve procfs/sysfs/devfs paths under `root` instead of `/`.
    pub fn with_host_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = HostRoot::new(root.as_ref());
        self
    }

    pub fn gpu_backend(&self) -> &'static str {
        self.gpu.backend()
    }

    /// Refresh OS counters.
    fn refresh(&mut self) {
        self.system.refresh_specifics(refresh_kind());
        self.disks.refresh_list();
    }

    /// Collect CPU information.
    fn probe_cpu(&self) -> Result<CpuInfo, ProbeError> {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(ProbeError::Unavailable("CPU"));
        }

        let cores = cpus.len() as u32;
        let usage_percent =
            cpus.iter().map(|cpu| cpu.cpu_usage() as f64).sum::<f64>() / cores as f64;

        let cpuinfo = self.root.read("/proc/cpuinfo").ok();
        let model = resolve_cpu_model(cpuinfo.as_deref(), cpus[0].brand());

        let frequency_mhz = self
            .read_cpu_frequency()
            .unwrap_or_else(|| cpus[0].frequency() as f64);

        Ok(CpuInfo {
            cores,
            model,
            architecture: std::env::consts::ARCH.to_string(),
            frequency_mhz,
            usage_percent,
        })
    }

    /// Read current CPU frequency in MHz.
    fn read_cpu_frequency(&self) -> Option<f64> {
        let freq_khz = self
            .root
            .read("/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq")
            .ok()?
            .trim()
            .parse::<f64>()
            .ok()?;

        Some(freq_khz / 1000.0)
    }

    /// Collect memory information.
    fn probe_memory(&self) -> Result<MemoryInfo, ProbeError> {
        memory_info(
            self.system.total_memory(),
            self.system.available_memory(),
            self.system.used_memory(),
        )
    }

    /// Collect root filesystem usage and media type.
    fn probe_disk(&self) -> Result<DiskInfo, ProbeError> {
        let disk = self
            .disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .ok_or(ProbeError::Unavailable("root disk"))?;

        let total_bytes = disk.total_space();
        let available_bytes = disk.available_space().min(total_bytes);
        let used_bytes = total_bytes - available_bytes;
        let usage_percent = if total_bytes > 0 {
            used_bytes as f64 / total_bytes as f64 * 100.0
        } else {
            0.0
        };

        let device = disk.name().to_string_lossy();
        let disk_type = classify_disk(&device, |block| read_rotational_flag(&self.root, block));

        Ok(DiskInfo {
            disk_type,
            total_bytes,
            available_bytes,
            used_bytes,
            usage_percent,
        })
    }

    fn probe_gpu(&self) -> Result<GpuInfo, ProbeError> {
        self.gpu.query()
    }

    fn probe_npu(&self) -> NpuInfo {
        detect_npu(&self.root, &NPU_DETECTION_ORDER)
    }
}

/// CPU model: /proc/cpuinfo, then the sysinfo brand string, then "Unknown".
fn resolve_cpu_model(cpuinfo: Option<&str>, brand: &str) -> String {
    cpuinfo
        .and_then(parse_cpu_model)
        .or_else(|| Some(brand.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Used bytes are reported as the OS counts them; the percentage is taken
/// from what is still available.
fn memory_info(total: u64, available: u64, used: u64) -> Result<MemoryInfo, ProbeError> {
    if total == 0 {
        return Err(ProbeError::Unavailable("memory"));
    }
    let available_bytes = available.min(total);

    Ok(MemoryInfo {
        total_bytes: total,
        available_bytes,
        used_bytes: used.min(total),
        usage_percent: (total - available_bytes) as f64 / total as f64 * 100.0,
    })
}

fn degrade<T>(resource: &str, result: Result<T, ProbeError>, fallback: impl FnOnce() -> T) -> T {
    result.unwrap_or_else(|err| {
        debug!("{} probe degraded: {}", resource, err);
        fallback()
    })
}

fn assemble(
    cpu: Result<CpuInfo, ProbeError>,
    memory: Result<MemoryInfo, ProbeError>,
    disk: Result<DiskInfo, ProbeError>,
    gpu: Result<GpuInfo, ProbeError>,
    npu: NpuInfo,
) -> ComputeInfo {
    ComputeInfo {
        cpu: degrade("CPU", cpu, CpuInfo::default),
        memory: degrade("Memory", memory, MemoryInfo::default),
        disk: degrade("Disk", disk, DiskInfo::default),
        gpu: degrade("GPU", gpu, GpuInfo::unavailable),
        npu,
    }
}

impl ComputeProbe for HardwareProbe {
    fn probe(&mut self) -> ComputeInfo {
        self.refresh();

        assemble(
            self.probe_cpu(),
            self.probe_memory(),
            self.probe_disk(),
            self.probe_gpu(),
            self.probe_npu(),
        )
    }
}
