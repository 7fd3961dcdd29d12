//! Core traits for partition table readers

use crate::types::Zone;
use std::io::{Read, Seek};

/// Trait for decoded partition tables
///
/// A table knows the sector size its offsets were computed with and reports
/// every slot it holds, in slot order.
pub trait ZoneTable: Send + Sync {
    /// Get a human-readable identifier for this table type
    fn identify(&self) -> &str;

    /// Bytes per sector used for all derived offsets
    fn sector_size(&self) -> u16;

    /// Get all zones in this partition table
    fn zones(&self) -> Vec<Zone>;

    /// Get a specific zone by slot
    fn get_zone(&self, slot: usize) -> Option<Zone> {
        self.zones().into_iter().find(|zone| zone.slot == slot)
    }
}

/// Combined trait for Read + Seek
pub trait ReadSeek: Read + Seek + Send {}

/// Blanket implementation for any type that implements Read + Seek
impl<T: Read + Seek + Send> ReadSeek for T {}
