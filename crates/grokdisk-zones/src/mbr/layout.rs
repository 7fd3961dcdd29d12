//! MBR table geometry

use serde::{Deserialize, Serialize};

/// Where the primary partition table lives and how its sectors are sized
///
/// The entry size and slot count are fixed by the on-disk format. The table
/// offset and sector size are overridable; the sector size is never detected
/// from the image.
///
/// # Structure
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0x000   446   Bootstrap code
/// 0x1BE   16    Partition entry 1
/// 0x1CE   16    Partition entry 2
/// 0x1DE   16    Partition entry 3
/// 0x1EE   16    Partition entry 4
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// Absolute byte offset of the first partition entry
    pub table_offset: u64,

    /// Bytes per sector of the imaged device
    pub sector_size: u16,
}

impl TableLayout {
    /// Offset of the first partition entry
    pub const DEFAULT_TABLE_OFFSET: u64 = 0x1BE;

    /// Sector size assumed for legacy images
    pub const DEFAULT_SECTOR_SIZE: u16 = 512;

    /// Size of each partition entry
    pub const ENTRY_SIZE: usize = 0x10;

    /// Number of primary partition entries
    pub const SLOT_COUNT: usize = 4;

    /// Bytes consumed by the whole table
    pub const TABLE_SIZE: usize = Self::ENTRY_SIZE * Self::SLOT_COUNT;

    /// Override the sector size
    pub fn with_sector_size(mut self, sector_size: u16) -> Self {
        self.sector_size = sector_size;
        self
    }

    /// Override the table offset
    pub fn with_table_offset(mut self, table_offset: u64) -> Self {
        self.table_offset = table_offset;
        self
    }

    /// Absolute byte offset of the entry in `slot`
    pub fn entry_offset(&self, slot: usize) -> u64 {
        self.table_offset + (slot * Self::ENTRY_SIZE) as u64
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            table_offset: Self::DEFAULT_TABLE_OFFSET,
            sector_size: Self::DEFAULT_SECTOR_SIZE,
        }
    }
}
