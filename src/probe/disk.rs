//! Storage media classification of the root device.

use super::host::HostRoot;
use crate::snapshot::data::DiskType;

/// Block device name of a SATA/SCSI partition path, e.g. `/dev/sda2` -> `sda`.
pub fn sata_block_name(device: &str) -> Option<&str> {
    if !device.starts_with("/dev/sd") {
        return None;
    }
    let name = device.rsplit('/').next()?;
    let name = name.trim_end_matches(|c: char| c.is_ascii_digit());
    (!name.is_empty()).then_some(name)
}

/// Classify the device backing the root mount.
///
/// Checks run in order and the first match wins: SD/eMMC controller, NVMe,
/// then SATA/SCSI disks, which are split into HDD and SSD by the kernel's
/// rotational flag. `rotational` is handed the block device name and returns
/// the flag file contents, or `None` when it cannot be read.
pub fn classify_disk<F>(device: &str, rotational: F) -> DiskType
where
    F: FnOnce(&str) -> Option<String>,
{
    if device.contains("mmcblk") {
        return DiskType::SdEmmc;
    }
    if device.contains("nvme") {
        return DiskType::NvmeSsd;
    }
    if let Some(block) = sata_block_name(device) {
        return match rotational(block) {
            Some(flag) if flag.trim() == "1" => DiskType::Hdd,
            Some(_) => DiskType::Ssd,
            None => DiskType::Unknown,
        };
    }
    DiskType::Unknown
}

/// Read `/sys/block/<block>/queue/rotational` under `root`.
pub fn read_rotational_flag(root: &HostRoot, block: &str) -> Option<String> {
    root.read(&format!("/sys/block/{}/queue/rotational", block)).ok()
}
