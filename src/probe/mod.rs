//! Host hardware probing.
//!
//! Every sub-probe (CPU, memory, disk, GPU, NPU) is independent: a failure in
//! one is reported as a [`ProbeError`] and degraded to that sub-probe's
//! "unavailable" default without affecting the others.

pub mod collector;
pub mod disk;
pub mod gpu;
pub mod host;
pub mod npu;
pub mod traits;

pub use collector::HardwareProbe;
pub use disk::classify_disk;
pub use gpu::{select_gpu_probe, GpuProbe, NullGpuProbe};
pub use host::HostRoot;
pub use npu::{detect_npu, NpuStrategy, NPU_DETECTION_ORDER};
pub use traits::ComputeProbe;

use std::path::PathBuf;
use thiserror::Error;

/// Why a single sub-probe could not produce a result.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A host information file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A host information file had unexpected contents
    #[error("failed to parse {what}: {value:?}")]
    Parse { what: &'static str, value: String },

    /// The OS reported nothing for this resource
    #[error("{0} information unavailable")]
    Unavailable(&'static str),

    /// GPU vendor library call failed
    #[error("GPU query failed: {0}")]
    Gpu(String),
}

impl ProbeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(what: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            what,
            value: value.into(),
        }
    }
}
