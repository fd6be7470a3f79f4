//! GPU introspection.
//!
//! GPU support is an optional capability. The vendor library is probed once at
//! startup by [`select_gpu_probe`]; if it cannot be initialized the
//! [`NullGpuProbe`] is used for the lifetime of the process.

use super::ProbeError;
use crate::snapshot::data::GpuInfo;

/// A GPU backend queried on every tick.
pub trait GpuProbe {
    /// Short backend name for logging.
    fn backend(&self) -> &'static str;

    /// Query the first GPU. A host without devices is `Ok` with
    /// `available == false`; an error means the query itself failed.
    fn query(&self) -> Result<GpuInfo, ProbeError>;
}

/// Backend used when no vendor library is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGpuProbe;

impl GpuProbe for NullGpuProbe {
    fn backend(&self) -> &'static str {
        "none"
    }

    fn query(&self) -> Result<GpuInfo, ProbeError> {
        Ok(GpuInfo::unavailable())
    }
}

/// Memory usage as a percentage, `0.0` when the total is unknown.
pub fn memory_usage_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

#[cfg(feature = "nvidia")]
mod nvidia {
    use super::*;
    use nvml_wrapper::Nvml;

    /// NVIDIA GPU probe using NVML.
    pub struct NvmlGpuProbe {
        nvml: Nvml,
    }

    impl NvmlGpuProbe {
        /// Load and initialize the NVML library.
        pub fn new() -> Result<Self, ProbeError> {
            let nvml = Nvml::init()
                .map_err(|e| ProbeError::Gpu(format!("Failed to initialize NVML: {}", e)))?;
            Ok(Self { nvml })
        }
    }

    impl GpuProbe for NvmlGpuProbe {
        fn backend(&self) -> &'static str {
            "nvml"
        }

        fn query(&self) -> Result<GpuInfo, ProbeError> {
            let gpu_err = |e: nvml_wrapper::error::NvmlError| ProbeError::Gpu(e.to_string());

            let count = self.nvml.device_count().map_err(gpu_err)?;
            if count == 0 {
                return Ok(GpuInfo::unavailable());
            }

            let device = self.nvml.device_by_index(0).map_err(gpu_err)?;
            let name = device.name().map_err(gpu_err)?;
            let memory = device.memory_info().map_err(gpu_err)?;
            let utilization = device.utilization_rates().map_err(gpu_err)?;

            Ok(GpuInfo {
                available: true,
                name: Some(name.clone()),
                model: Some(name),
                memory_total_bytes: memory.total,
                memory_used_bytes: memory.used,
                memory_usage_percent: memory_usage_percent(memory.used, memory.total),
                utilization_percent: utilization.gpu as f64,
            })
        }
    }
}

#[cfg(feature = "nvidia")]
pub use nvidia::NvmlGpuProbe;

/// Pick the GPU backend for this process.
pub fn select_gpu_probe() -> Box<dyn GpuProbe> {
    #[cfg(feature = "nvidia")]
    {
        match NvmlGpuProbe::new() {
            Ok(probe) => {
                tracing::info!("NVML initialized, GPU probing enabled");
                return Box::new(probe);
            }
            Err(err) => {
                tracing::warn!("{}, continuing without GPU support", err);
            }
        }
    }

    Box::new(NullGpuProbe)
}
