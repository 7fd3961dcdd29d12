//! MBR partition entries, type codes and CHS addressing

use super::layout::TableLayout;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw 16-byte partition table entry
///
/// Fields are kept exactly as stored. Nothing here is validated: an all-zero
/// entry is an ordinary unused slot, and implausible counts are passed through.
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     Status (0x80 = active)
/// 1       3     CHS start (head, sector, cylinder)
/// 4       1     Partition type
/// 5       3     CHS end (head, sector, cylinder)
/// 8       4     First sector LBA (LE)
/// 12      4     Sector count (LE)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub status: u8,
    pub start_head: u8,
    pub start_sector: u8,
    pub start_cylinder: u8,
    pub partition_type: u8,
    pub end_head: u8,
    pub end_sector: u8,
    pub end_cylinder: u8,
    pub first_sector_lba: u32,
    pub sector_count: u32,
}

impl PartitionEntry {
    /// Size of an encoded entry
    pub const SIZE: usize = TableLayout::ENTRY_SIZE;

    /// Status value marking the active partition
    pub const STATUS_ACTIVE: u8 = 0x80;

    /// Decode an entry from its on-disk bytes
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            status: bytes[0],
            start_head: bytes[1],
            start_sector: bytes[2],
            start_cylinder: bytes[3],
            partition_type: bytes[4],
            end_head: bytes[5],
            end_sector: bytes[6],
            end_cylinder: bytes[7],
            first_sector_lba: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            sector_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    /// Encode the entry back to its on-disk bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.status;
        bytes[1] = self.start_head;
        bytes[2] = self.start_sector;
        bytes[3] = self.start_cylinder;
        bytes[4] = self.partition_type;
        bytes[5] = self.end_head;
        bytes[6] = self.end_sector;
        bytes[7] = self.end_cylinder;
        bytes[8..12].copy_from_slice(&self.first_sector_lba.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.sector_count.to_le_bytes());
        bytes
    }

    /// Byte offset of the first sector
    pub fn start_offset_bytes(&self, sector_size: u16) -> u64 {
        u64::from(self.first_sector_lba) * u64::from(sector_size)
    }

    /// Length of the partition in bytes
    pub fn size_bytes(&self, sector_size: u16) -> u64 {
        u64::from(self.sector_count) * u64::from(sector_size)
    }

    /// True for unused slots
    pub fn is_empty(&self) -> bool {
        self.partition_type == 0 && self.sector_count == 0
    }

    /// True if the status byte carries the active flag
    pub fn is_bootable(&self) -> bool {
        self.status == Self::STATUS_ACTIVE
    }

    /// Interpret the type code
    pub fn kind(&self) -> PartitionType {
        PartitionType::from_byte(self.partition_type)
    }

    /// Decoded CHS address of the first sector
    pub fn start_chs(&self) -> ChsAddress {
        ChsAddress::from_bytes([self.start_head, self.start_sector, self.start_cylinder])
    }

    /// Decoded CHS address of the last sector
    pub fn end_chs(&self) -> ChsAddress {
        ChsAddress::from_bytes([self.end_head, self.end_sector, self.end_cylinder])
    }
}

/// MBR partition type codes
///
/// Only used for display; readers never reject unknown codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionType {
    /// Empty/unused partition entry
    Empty,
    /// FAT12, CHS
    Fat12,
    /// FAT16 < 32MB, CHS
    Fat16Small,
    /// Extended partition, CHS
    Extended,
    /// FAT16 >= 32MB, CHS
    Fat16,
    /// NTFS/exFAT/HPFS
    Ntfs,
    /// FAT32, CHS
    Fat32Chs,
    /// FAT32, LBA
    Fat32Lba,
    /// FAT16, LBA
    Fat16Lba,
    /// Extended partition, LBA
    ExtendedLba,
    /// Linux swap
    LinuxSwap,
    /// Linux native (ext2/ext3/ext4)
    LinuxNative,
    /// Linux LVM physical volume
    LinuxLvm,
    /// GPT protective MBR
    GptProtective,
    /// EFI system partition
    EfiSystem,
    /// Any other code
    Unknown(u8),
}

impl PartitionType {
    /// Create a partition type from a byte value
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => Self::Empty,
            0x01 => Self::Fat12,
            0x04 => Self::Fat16Small,
            0x05 => Self::Extended,
            0x06 => Self::Fat16,
            0x07 => Self::Ntfs,
            0x0B => Self::Fat32Chs,
            0x0C => Self::Fat32Lba,
            0x0E => Self::Fat16Lba,
            0x0F => Self::ExtendedLba,
            0x82 => Self::LinuxSwap,
            0x83 => Self::LinuxNative,
            0x8E => Self::LinuxLvm,
            0xEE => Self::GptProtective,
            0xEF => Self::EfiSystem,
            _ => Self::Unknown(b),
        }
    }

    /// Get a human-readable name for this partition type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Fat12 => "FAT12",
            Self::Fat16Small => "FAT16 (<32MB)",
            Self::Extended => "Extended",
            Self::Fat16 => "FAT16",
            Self::Ntfs => "NTFS/exFAT",
            Self::Fat32Chs => "FAT32 (CHS)",
            Self::Fat32Lba => "FAT32 (LBA)",
            Self::Fat16Lba => "FAT16 (LBA)",
            Self::ExtendedLba => "Extended (LBA)",
            Self::LinuxSwap => "Linux swap",
            Self::LinuxNative => "Linux",
            Self::LinuxLvm => "Linux LVM",
            Self::GptProtective => "GPT Protective",
            Self::EfiSystem => "EFI System",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for PartitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// CHS (Cylinder-Head-Sector) address
///
/// Maximum values: 1023 cylinders, 255 heads, 63 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChsAddress {
    pub cylinder: u16,
    pub head: u8,
    pub sector: u8,
}

impl ChsAddress {
    /// Parse CHS address from 3 bytes
    ///
    /// - Byte 0: Head (0-255)
    /// - Byte 1: Sector (bits 0-5) + Cylinder high (bits 6-7)
    /// - Byte 2: Cylinder low (bits 0-7)
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        let head = bytes[0];
        let sector = bytes[1] & 0x3F;
        let cyl_high = ((bytes[1] & 0xC0) as u16) << 2;
        let cylinder = cyl_high | bytes[2] as u16;

        Self {
            cylinder,
            head,
            sector,
        }
    }

}

impl fmt::Display for ChsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C:{}/H:{}/S:{}", self.cylinder, self.head, self.sector)
    }
}
