//! # grokdisk Zones
//!
//! Partition table readers for disk images.
//!
//! - **MBR**: the legacy four-slot primary partition table
//!
//! Readers decode structure only. Offsets come out in bytes so they can be
//! handed straight to `mount -o offset=…`; nothing here checks signatures or
//! interprets filesystems.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grokdisk_zones::mbr::{ImageMetadata, TableLayout};
//! use grokdisk_core::ZoneTable;
//!
//! let image = ImageMetadata::analyze_with("disk.img", &TableLayout::default()).unwrap();
//!
//! println!("Partition table: {}", image.identify());
//! for zone in image.zones() {
//!     println!("  {}", zone);
//! }
//! ```

pub mod mbr;

pub use mbr::{ImageMetadata, Partition, PartitionEntry, TableLayout};
