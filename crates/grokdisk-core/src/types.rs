//! Core types shared by partition table readers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte-addressed partition slot within a disk image
///
/// Zones are the machine-facing projection of a partition table: every slot
/// is reported, empty ones included, so consumers see positional indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Table slot this zone was decoded from
    pub slot: usize,

    /// Offset from start of image in bytes
    pub offset: u64,

    /// Length of zone in bytes
    pub length: u64,

    /// Raw partition type code
    pub partition_type: u8,

    /// Whether the slot carries the active/bootable flag
    pub bootable: bool,
}

impl Zone {
    /// Create a new zone
    pub fn new(slot: usize, offset: u64, length: u64, partition_type: u8) -> Self {
        Self {
            slot,
            offset,
            length,
            partition_type,
            bootable: false,
        }
    }

    /// Mark the zone as bootable
    pub fn with_bootable(mut self, bootable: bool) -> Self {
        self.bootable = bootable;
        self
    }

    /// True for unused slots (no type and no extent)
    pub fn is_empty(&self) -> bool {
        self.partition_type == 0 && self.length == 0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zone {} [type 0x{:02X} @ 0x{:08X}, {}]",
            self.slot,
            self.partition_type,
            self.offset,
            format_size(self.length)
        )?;
        if self.bootable {
            write!(f, " *")?;
        }
        Ok(())
    }
}

/// Format size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
