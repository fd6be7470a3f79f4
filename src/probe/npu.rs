//! Neural accelerator detection.
//!
//! Vendors expose NPUs in unrelated ways, so detection is an ordered list of
//! strategies tried one after another; the first one that finds a device wins.
//! The order is [`NPU_DETECTION_ORDER`]: on a board that exposes both a
//! Rockchip NPU and a USB accelerator, the Rockchip device is reported.

use super::host::HostRoot;
use super::ProbeError;
use crate::snapshot::data::NpuInfo;
use std::fs;
use tracing::debug;

/// Strategies in the order they are tried.
pub const NPU_DETECTION_ORDER: [NpuStrategy; 2] =
    [NpuStrategy::Rockchip, NpuStrategy::UsbAccelerator];

/// Rockchip NPU device node.
pub const ROCKCHIP_DEVICE: &str = "/dev/rknpu";

/// Rockchip devfreq class directory.
pub const DEVFREQ_CLASS: &str = "/sys/class/devfreq";

/// Files that may carry the Rockchip NPU load, tried in order.
pub const ROCKCHIP_LOAD_PATHS: [&str; 2] = [
    "/sys/kernel/debug/rknpu/load",
    "/sys/class/devfreq/fdab0000.npu/load",
];

/// sysfs directory listing attached USB devices.
pub const USB_DEVICES: &str = "/sys/bus/usb/devices";

/// Known USB accelerators as (`vendor:product`, name, model).
pub const USB_ACCELERATORS: [(&str, &str, &str); 3] = [
    ("1a6e:089a", "Google Coral Edge TPU", "Edge TPU"),
    ("18d1:9302", "Google Coral Edge TPU", "Edge TPU"),
    ("03e7:2485", "Intel Movidius NCS2", "Myriad X VPU"),
];

/// One way of finding an NPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpuStrategy {
    /// On-SoC Rockchip NPU with a kernel load file
    Rockchip,
    /// USB-attached accelerator recognised by its vendor:product id
    UsbAccelerator,
}

impl NpuStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            NpuStrategy::Rockchip => "rockchip",
            NpuStrategy::UsbAccelerator => "usb",
        }
    }

    /// Run this strategy against the host.
    pub fn detect(&self, root: &HostRoot) -> Option<NpuInfo> {
        match self {
            NpuStrategy::Rockchip => detect_rockchip(root),
            NpuStrategy::UsbAccelerator => detect_usb_accelerator(root),
        }
    }
}

/// Try each strategy in `order`, returning the first detected device.
pub fn detect_npu(root: &HostRoot, order: &[NpuStrategy]) -> NpuInfo {
    order
        .iter()
        .find_map(|strategy| {
            let found = strategy.detect(root);
            if found.is_some() {
                debug!("NPU detected by {} strategy", strategy.name());
            }
            found
        })
        .unwrap_or_else(NpuInfo::unavailable)
}

/// Parse an NPU load file.
///
/// Accepts a bare number with an optional `%` suffix (`"10"`, `"10%"`) as
/// well as the per-core debugfs format
/// (`"NPU load:  Core0: 10%, Core1: 20%,"`), which is averaged.
pub fn parse_npu_load(raw: &str) -> Result<f64, ProbeError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.trim_end_matches('%').trim().parse::<f64>() {
        return Ok(value);
    }

    let cores: Vec<f64> = trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|token| token.strip_suffix('%'))
        .filter_map(|value| value.parse::<f64>().ok())
        .collect();
    if cores.is_empty() {
        return Err(ProbeError::parse("NPU load", trimmed));
    }
    Ok(cores.iter().sum::<f64>() / cores.len() as f64)
}

fn detect_rockchip(root: &HostRoot) -> Option<NpuInfo> {
    let has_device = root.exists(ROCKCHIP_DEVICE);
    if !has_device && !root.exists(DEVFREQ_CLASS) {
        return None;
    }

    for path in ROCKCHIP_LOAD_PATHS {
        if !root.exists(path) {
            continue;
        }
        match root.read(path).and_then(|raw| parse_npu_load(&raw)) {
            Ok(load) => {
                return Some(NpuInfo::detected("Rockchip NPU", "RK3588/RK3568 NPU", load));
            }
            Err(err) => {
                debug!("Rockchip NPU load unreadable: {}", err);
                break;
            }
        }
    }

    // Device present but no usable load figure.
    has_device.then(|| NpuInfo::detected("Rockchip NPU", "RK35xx NPU", 0.0))
}

/// `vendor:product` ids of attached USB devices, lower-case.
pub fn usb_device_ids(root: &HostRoot) -> Vec<String> {
    let dir = root.path(USB_DEVICES);
    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let vendor = fs::read_to_string(path.join("idVendor")).ok()?;
            let product = fs::read_to_string(path.join("idProduct")).ok()?;
            Some(format!("{}:{}", vendor.trim(), product.trim()).to_lowercase())
        })
        .collect()
}

fn detect_usb_accelerator(root: &HostRoot) -> Option<NpuInfo> {
    let ids = usb_device_ids(root);
    USB_ACCELERATORS
        .iter()
        .find(|(signature, _, _)| ids.iter().any(|id| id == signature))
        // No utilization API exists for these devices.
        .map(|(_, name, model)| NpuInfo::detected(name, model, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, host_path: &str, contents: &str) {
        let path = root.join(host_path.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn add_usb_device(root: &Path, port: &str, vendor: &str, product: &str) {
        write(root, &format!("{}/{}/idVendor", USB_DEVICES, port), &format!("{}\n", vendor));
        write(root, &format!("{}/{}/idProduct", USB_DEVICES, port), &format!("{}\n", product));
    }

    #[test]
    fn test_parse_npu_load_formats() {
        assert_eq!(parse_npu_load("10").unwrap(), 10.0);
        assert_eq!(parse_npu_load(" 42%\n").unwrap(), 42.0);
        assert_eq!(
            parse_npu_load("NPU load:  Core0: 10%, Core1: 20%, Core2:  30%,\n").unwrap(),
            20.0
        );
        assert!(parse_npu_load("busy").is_err());
    }

    #[test]
    fn test_nothing_detected() {
        let dir = TempDir::new().unwrap();
        let info = detect_npu(&HostRoot::new(dir.path()), &NPU_DETECTION_ORDER);
        assert_eq!(info, NpuInfo::unavailable());
    }

    #[test]
    fn test_rockchip_load() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ROCKCHIP_DEVICE, "");
        write(dir.path(), ROCKCHIP_LOAD_PATHS[0], "35%\n");

        let info = detect_npu(&HostRoot::new(dir.path()), &NPU_DETECTION_ORDER);
        assert!(info.available);
        assert_eq!(info.name.as_deref(), Some("Rockchip NPU"));
        assert_eq!(info.model.as_deref(), Some("RK3588/RK3568 NPU"));
        assert_eq!(info.utilization_percent, 35.0);
    }

    #[test]
    fn test_rockchip_devfreq_load_without_device_node() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ROCKCHIP_LOAD_PATHS[1], "12");

        let info = NpuStrategy::Rockchip
            .detect(&HostRoot::new(dir.path()))
            .expect("devfreq load should be detected");
        assert_eq!(info.utilization_percent, 12.0);
    }

    #[test]
    fn test_rockchip_device_with_unreadable_load() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ROCKCHIP_DEVICE, "");
        write(dir.path(), ROCKCHIP_LOAD_PATHS[0], "permission denied");

        let info = detect_npu(&HostRoot::new(dir.path()), &NPU_DETECTION_ORDER);
        assert!(info.available);
        assert_eq!(info.model.as_deref(), Some("RK35xx NPU"));
        assert_eq!(info.utilization_percent, 0.0);
    }

    #[test]
    fn test_devfreq_without_npu_is_not_rockchip() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sys/class/devfreq/gpu")).unwrap();

        assert!(NpuStrategy::Rockchip.detect(&HostRoot::new(dir.path())).is_none());
    }

    #[test]
    fn test_usb_accelerators() {
        let dir = TempDir::new().unwrap();
        add_usb_device(dir.path(), "1-1", "1d6b", "0002");
        add_usb_device(dir.path(), "1-1.2", "03E7", "2485");

        let info = detect_npu(&HostRoot::new(dir.path()), &NPU_DETECTION_ORDER);
        assert_eq!(info.name.as_deref(), Some("Intel Movidius NCS2"));
        assert_eq!(info.model.as_deref(), Some("Myriad X VPU"));
        assert_eq!(info.utilization_percent, 0.0);

        add_usb_device(dir.path(), "2-1", "18d1", "9302");
        let info = detect_npu(&HostRoot::new(dir.path()), &NPU_DETECTION_ORDER);
        assert_eq!(info.name.as_deref(), Some("Google Coral Edge TPU"));
    }

    #[test]
    fn test_rockchip_takes_priority_over_usb() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ROCKCHIP_DEVICE, "");
        write(dir.path(), ROCKCHIP_LOAD_PATHS[0], "7%");
        add_usb_device(dir.path(), "1-1", "1a6e", "089a");
        let root = HostRoot::new(dir.path());

        let info = detect_npu(&root, &NPU_DETECTION_ORDER);
        assert_eq!(info.name.as_deref(), Some("Rockchip NPU"));

        // Reversing the order changes the outcome, so the order is what decides.
        let reversed = [NpuStrategy::UsbAccelerator, NpuStrategy::Rockchip];
        let info = detect_npu(&root, &reversed);
        assert_eq!(info.name.as_deref(), Some("Google Coral Edge TPU"));
    }
}
