//! Access to procfs/sysfs/devfs files relative to a configurable root.

use super::ProbeError;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem root that absolute host paths are resolved against.
///
/// Production probes use `/`; tests point this at a temporary directory that
/// mimics the relevant parts of `/proc`, `/sys` and `/dev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRoot(PathBuf);

impl Default for HostRoot {
    fn default() -> Self {
        Self(PathBuf::from("/"))
    }
}

impl HostRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    /// Resolve an absolute host path (e.g. `/proc/cpuinfo`) under this root.
    pub fn path(&self, host_path: &str) -> PathBuf {
        self.0.join(host_path.trim_start_matches('/'))
    }

    pub fn exists(&self, host_path: &str) -> bool {
        self.path(host_path).exists()
    }

    pub fn read(&self, host_path: &str) -> Result<String, ProbeError> {
        read_file(&self.path(host_path))
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, ProbeError> {
    fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))
}

/// Extract the CPU model from `/proc/cpuinfo` contents.
///
/// The first line naming either the model (`model name`, x86) or the board
/// hardware (`Hardware`, ARM) wins.
pub fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|line| {
            let lower = line.to_lowercase();
            lower.contains("model name") || lower.contains("hardware")
        })
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|model| !model.is_empty())
}
