//! # grokdisk Core
//!
//! Core traits, types, and error handling shared by the grokdisk crates.
//!
//! - **Zone**: a byte-addressed partition slot, ready to hand to `mount`
//! - **ZoneTable**: any decoded partition table that can report zones
//! - **Error**: the open/seek/decode failure taxonomy
//!
//! ## Example
//!
//! ```rust
//! use grokdisk_core::{Zone, ZoneTable};
//!
//! fn print_zones(table: &dyn ZoneTable) {
//!     println!("{} ({} byte sectors)", table.identify(), table.sector_size());
//!     for zone in table.zones() {
//!         println!("  {}", zone);
//!     }
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{Error, ErrorKind, Result};
pub use traits::{ReadSeek, ZoneTable};
pub use types::{format_size, Zone};
