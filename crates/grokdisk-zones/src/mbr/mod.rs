//! MBR (Master Boot Record) primary partition table reader

pub mod layout;
pub mod types;

use grokdisk_core::{Error, ReadSeek, Result, Zone, ZoneTable};
use serde::Serialize;
use std::fmt;
use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Deref;
use std::path::Path;

pub use layout::TableLayout;
pub use types::{ChsAddress, PartitionEntry, PartitionType};

/// Decoded primary partition table of a disk image
///
/// Always holds exactly four entries in slot order; unused slots are kept as
/// all-zero entries. Values are immutable once read.
///
/// # Example
///
/// ```rust,no_run
/// use grokdisk_zones::mbr::ImageMetadata;
///
/// let image = ImageMetadata::analyze("disk.img").unwrap();
/// for partition in image.partitions() {
///     println!("{}", partition);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    sector_size: u16,
    file_path: String,
    entries: [PartitionEntry; TableLayout::SLOT_COUNT],
}

impl ImageMetadata {
    /// Open an image file and decode its partition table with the default layout
    pub fn analyze(path: impl AsRef<Path>) -> Result<Self> {
        Self::analyze_with(path, &TableLayout::default())
    }

    /// Open an image file and decode its partition table
    ///
    /// The file is opened read-only and closed before returning, on success
    /// and on every failure.
    ///
    /// # Errors
    ///
    /// - [`Error::OpenFailed`] if the file cannot be opened, or is neither a
    ///   regular file nor a block device (directories, FIFOs, sockets)
    /// - [`Error::SeekFailed`] if the image ends at or before the table offset
    /// - [`Error::DecodeFailed`] if a slot cannot be fully read
    pub fn analyze_with(path: impl AsRef<Path>, layout: &TableLayout) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let mut file = File::open(path).map_err(|e| Error::open_failed(label.as_str(), e))?;
        let metadata = file
            .metadata()
            .map_err(|e| Error::open_failed(label.as_str(), e))?;
        if !is_image_source(&metadata) {
            return Err(Error::open_failed(
                label,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "not a regular file or block device",
                ),
            ));
        }

        Self::read_from(&mut file, label, layout)
    }

    /// Decode the partition table from an already-open stream
    ///
    /// `file_path` is recorded verbatim as the image identifier. The stream is
    /// left wherever decoding stopped; retrying requires a fresh stream.
    pub fn read_from(
        stream: &mut dyn ReadSeek,
        file_path: impl Into<String>,
        layout: &TableLayout,
    ) -> Result<Self> {
        let offset = layout.table_offset;

        // Seeking past the end succeeds on files, so check the length first
        let end = stream
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::seek_failed(offset, e))?;
        if end <= offset {
            return Err(Error::seek_failed(
                offset,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("image is {} bytes, partition table starts at byte {}", end, offset),
                ),
            ));
        }
        stream
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::seek_failed(offset, e))?;

        tracing::debug!(offset, image_len = end, "located partition table");

        let mut entries = [PartitionEntry::default(); TableLayout::SLOT_COUNT];
        for (slot, entry) in entries.iter_mut().enumerate() {
            let mut raw = [0u8; PartitionEntry::SIZE];
            stream
                .read_exact(&mut raw)
                .map_err(|e| Error::decode_failed(slot, e))?;
            *entry = PartitionEntry::from_bytes(&raw);

            tracing::trace!(
                slot,
                at = layout.entry_offset(slot),
                status = entry.status,
                partition_type = entry.partition_type,
                first_sector_lba = entry.first_sector_lba,
                sector_count = entry.sector_count,
                "decoded partition entry"
            );
        }

        Ok(Self {
            sector_size: layout.sector_size,
            file_path: file_path.into(),
            entries,
        })
    }

    /// Bytes per sector used for derived offsets
    pub fn sector_size(&self) -> u16 {
        self.sector_size
    }

    /// Identifier of the backing image
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Raw entries in slot order
    pub fn entries(&self) -> &[PartitionEntry; TableLayout::SLOT_COUNT] {
        &self.entries
    }

    /// Partition view for a slot
    pub fn partition(&self, slot: usize) -> Option<Partition<'_>> {
        self.entries.get(slot).map(|entry| Partition {
            slot,
            entry,
            image: self,
        })
    }

    /// All four partitions in slot order
    pub fn partitions(&self) -> impl ExactSizeIterator<Item = Partition<'_>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(move |(slot, entry)| Partition {
                slot,
                entry,
                image: self,
            })
    }

    /// Re-encode the table region exactly as it is laid out on disk
    pub fn table_bytes(&self) -> [u8; TableLayout::TABLE_SIZE] {
        let mut bytes = [0u8; TableLayout::TABLE_SIZE];
        for (chunk, entry) in bytes
            .chunks_exact_mut(PartitionEntry::SIZE)
            .zip(self.entries.iter())
        {
            chunk.copy_from_slice(&entry.to_bytes());
        }
        bytes
    }
}

/// Regular files and block devices are the only seekable image sources
fn is_image_source(metadata: &Metadata) -> bool {
    metadata.is_file() || is_block_device(metadata)
}

#[cfg(unix)]
fn is_block_device(metadata: &Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    metadata.file_type().is_block_device()
}

#[cfg(not(unix))]
fn is_block_device(_metadata: &Metadata) -> bool {
    false
}

impl ZoneTable for ImageMetadata {
    fn identify(&self) -> &str {
        "Master Boot Record"
    }

    fn sector_size(&self) -> u16 {
        self.sector_size
    }

    fn zones(&self) -> Vec<Zone> {
        self.partitions().map(|p| p.to_zone()).collect()
    }
}

/// One table slot together with the image it was read from
///
/// Borrows the owning [`ImageMetadata`] for its sector size; it never
/// outlives or owns it. Dereferences to the raw [`PartitionEntry`].
#[derive(Debug, Clone, Copy)]
pub struct Partition<'a> {
    slot: usize,
    entry: &'a PartitionEntry,
    image: &'a ImageMetadata,
}

impl<'a> Partition<'a> {
    /// Table slot index (0-3)
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The raw entry
    pub fn entry(&self) -> &'a PartitionEntry {
        self.entry
    }

    /// Start of the partition in bytes from the start of the image
    pub fn start_offset_bytes(&self) -> u64 {
        self.entry.start_offset_bytes(self.image.sector_size)
    }

    /// Length of the partition in bytes
    pub fn size_bytes(&self) -> u64 {
        self.entry.size_bytes(self.image.sector_size)
    }

    /// First byte past the end of the partition
    pub fn end_offset_bytes(&self) -> u64 {
        self.start_offset_bytes() + self.size_bytes()
    }

    /// One-line diagnostic summary
    pub fn describe(&self) -> String {
        format!(
            "status: 0x{:02X} type: 0x{:02X} ({}), start: {} sectors ({} B), length: {} sectors ({} B)",
            self.entry.status,
            self.entry.partition_type,
            self.entry.kind(),
            self.entry.first_sector_lba,
            self.start_offset_bytes(),
            self.entry.sector_count,
            self.size_bytes()
        )
    }

    /// Project into a byte-addressed zone
    pub fn to_zone(&self) -> Zone {
        Zone::new(
            self.slot,
            self.start_offset_bytes(),
            self.size_bytes(),
            self.entry.partition_type,
        )
        .with_bootable(self.entry.is_bootable())
    }
}

impl Deref for Partition<'_> {
    type Target = PartitionEntry;

    fn deref(&self) -> &PartitionEntry {
        self.entry
    }
}

impl fmt::Display for Partition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grokdisk_core::ErrorKind;
    use proptest::prelude::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const FAT32_ENTRY: [u8; 16] = [
        0x80, 0x00, 0x01, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x01, 0xF8, 0x0B,
        0x00,
    ];

    /// 1 KiB image with a bootable FAT32 entry in slot 0 and three empty slots
    fn create_test_image() -> Vec<u8> {
        let mut image = vec![0u8; 1024];
        image[0x1BE..0x1BE + 16].copy_from_slice(&FAT32_ENTRY);
        image
    }

    fn read(image: Vec<u8>) -> Result<ImageMetadata> {
        let mut cursor = Cursor::new(image);
        ImageMetadata::read_from(&mut cursor, "test.img", &TableLayout::default())
    }

    #[test]
    fn test_read_single_partition_image() {
        let image = read(create_test_image()).unwrap();

        assert_eq!(image.sector_size(), 512);
        assert_eq!(image.file_path(), "test.img");
        assert_eq!(image.partitions().len(), 4);

        let first = image.partition(0).unwrap();
        assert_eq!(first.status, 0x80);
        assert_eq!(first.partition_type, 0x0B);
        assert_eq!(first.first_sector_lba, 63);
        assert_eq!(first.start_offset_bytes(), 63 * 512);
        assert_eq!(first.start_offset_bytes(), 32256);
        assert_eq!(first.size_bytes(), 784_385 * 512);

        for partition in image.partitions().skip(1) {
            assert_eq!(*partition.entry(), PartitionEntry::default());
            assert_eq!(partition.start_offset_bytes(), 0);
            assert_eq!(partition.size_bytes(), 0);
        }
        assert!(image.partition(4).is_none());
    }

    #[test]
    fn test_empty_slots_are_preserved() {
        let image = read(vec![0u8; 512]).unwrap();

        assert_eq!(image.entries().len(), 4);
        assert!(image.partitions().all(|p| p.is_empty()));
        assert_eq!(image.zones().len(), 4);
    }

    #[test]
    fn test_table_bytes_reproduce_region() {
        let mut raw = vec![0u8; 512];
        for (i, byte) in raw[0x1BE..0x1FE].iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(29) ^ 0xA5;
        }
        let region: Vec<u8> = raw[0x1BE..0x1FE].to_vec();

        let image = read(raw).unwrap();
        assert_eq!(image.table_bytes().to_vec(), region);
    }

    proptest! {
        #[test]
        fn test_any_table_region_reencodes(
            region in proptest::collection::vec(any::<u8>(), TableLayout::TABLE_SIZE),
            prefix in proptest::collection::vec(any::<u8>(), 446)
        ) {
            let mut raw = prefix;
            raw.extend_from_slice(&region);

            let image = read(raw).unwrap();
            prop_assert_eq!(image.table_bytes().to_vec(), region);
        }

        #[test]
        fn test_any_truncated_table_fails_at_first_partial_slot(extra in 1..TableLayout::TABLE_SIZE) {
            let err = read(vec![0u8; 446 + extra]).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::DecodeFailed);
            prop_assert_eq!(err.slot(), Some(extra / PartitionEntry::SIZE));
        }
    }

    #[test]
    fn test_short_image_fails_to_seek() {
        for len in [0usize, 1, 200, 445] {
            let err = read(vec![0u8; len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SeekFailed, "len {}", len);
        }
    }

    #[test]
    fn test_image_ending_at_table_fails_to_seek() {
        let err = read(vec![0u8; 446]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SeekFailed);
        assert_eq!(err.slot(), None);
        assert_eq!(err.io_error().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_truncated_table_reports_first_missing_slot() {
        for extra in 1..TableLayout::TABLE_SIZE {
            let err = read(vec![0u8; 446 + extra]).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::DecodeFailed, "extra {}", extra);
            assert_eq!(err.slot(), Some(extra / 16), "extra {}", extra);
        }
    }

    #[test]
    fn test_image_ending_at_table_end_decodes() {
        let mut raw = vec![0u8; 446 + 64];
        raw[446..462].copy_from_slice(&FAT32_ENTRY);

        let image = read(raw).unwrap();
        assert_eq!(image.partition(0).unwrap().first_sector_lba, 63);
    }

    #[test]
    fn test_sector_size_override() {
        let mut cursor = Cursor::new(create_test_image());
        let layout = TableLayout::default().with_sector_size(4096);
        let image = ImageMetadata::read_from(&mut cursor, "4k.img", &layout).unwrap();

        let first = image.partition(0).unwrap();
        assert_eq!(first.start_offset_bytes(), 63 * 4096);
        assert_eq!(first.end_offset_bytes(), (63 + 784_385) * 4096);
    }

    #[test]
    fn test_table_offset_override() {
        let mut raw = vec![0u8; 64];
        raw[..16].copy_from_slice(&FAT32_ENTRY);

        let mut cursor = Cursor::new(raw);
        let layout = TableLayout::default().with_table_offset(0);
        let image = ImageMetadata::read_from(&mut cursor, "table.bin", &layout).unwrap();
        assert_eq!(image.partition(0).unwrap().first_sector_lba, 63);

        let mut cursor = Cursor::new(vec![0u8; 64]);
        let layout = TableLayout::default().with_table_offset(64);
        let err = ImageMetadata::read_from(&mut cursor, "table.bin", &layout).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SeekFailed);
    }

    #[test]
    fn test_metadata_serializes_raw_entries() {
        let image = read(create_test_image()).unwrap();
        let json = serde_json::to_value(&image).unwrap();

        assert_eq!(json["sector_size"], 512);
        assert_eq!(json["file_path"], "test.img");
        assert_eq!(json["entries"].as_array().unwrap().len(), 4);
        assert_eq!(json["entries"][0]["sector_count"], 784_385);
        assert_eq!(json["entries"][2]["status"], 0);
    }

    #[test]
    fn test_describe() {
        let image = read(create_test_image()).unwrap();

        assert_eq!(
            image.partition(0).unwrap().describe(),
            "status: 0x80 type: 0x0B (FAT32 (CHS)), start: 63 sectors (32256 B), length: 784385 sectors (401605120 B)"
        );
        assert_eq!(
            image.partition(3).unwrap().to_string(),
            "status: 0x00 type: 0x00 (Empty), start: 0 sectors (0 B), length: 0 sectors (0 B)"
        );
    }

    #[test]
    fn test_zone_table() {
        let image = read(create_test_image()).unwrap();

        assert_eq!(image.identify(), "Master Boot Record");
        assert_eq!(ZoneTable::sector_size(&image), 512);

        let zone = image.get_zone(0).unwrap();
        assert_eq!(zone.offset, 32256);
        assert_eq!(zone.length, 401_605_120);
        assert_eq!(zone.partition_type, 0x0B);
        assert!(zone.bootable);
        assert!(image.get_zone(2).unwrap().is_empty());
        assert!(image.get_zone(7).is_none());
    }

    #[test]
    fn test_analyze_file() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        tmpfile.write_all(&create_test_image()).unwrap();
        tmpfile.flush().unwrap();

        let image = ImageMetadata::analyze(tmpfile.path()).unwrap();
        assert_eq!(image.file_path(), tmpfile.path().display().to_string());
        assert_eq!(image.partition(0).unwrap().start_offset_bytes(), 32256);
    }

    #[test]
    fn test_analyze_short_file_fails_to_seek() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        tmpfile.write_all(&[0u8; 100]).unwrap();
        tmpfile.flush().unwrap();

        let err = ImageMetadata::analyze(tmpfile.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SeekFailed);
    }

    #[test]
    fn test_analyze_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageMetadata::analyze(dir.path().join("missing.img")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OpenFailed);
        assert_eq!(err.io_error().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_analyze_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageMetadata::analyze(dir.path()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OpenFailed);
    }

    #[cfg(unix)]
    #[test]
    fn test_analyze_fifo_is_rejected_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("image.fifo");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());

        // Opening a FIFO for reading blocks until a writer shows up
        let writer_path = fifo.clone();
        let writer = std::thread::spawn(move || {
            if let Ok(mut pipe) = std::fs::OpenOptions::new().write(true).open(&writer_path) {
                let _ = pipe.write_all(&create_test_image());
            }
        });

        let err = ImageMetadata::analyze(&fifo).unwrap_err();
        writer.join().unwrap();

        assert_eq!(err.kind(), ErrorKind::OpenFailed);
        assert_eq!(err.io_error().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_concurrent_analyze_of_same_file() {
        let mut tmpfile = NamedTempFile::new().unwrap();
        tmpfile.write_all(&create_test_image()).unwrap();
        tmpfile.flush().unwrap();
        let path = std::sync::Arc::new(tmpfile.path().to_path_buf());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || ImageMetadata::analyze(path.as_path()).unwrap())
            })
            .collect();

        let results: Vec<ImageMetadata> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for image in &results {
            assert_eq!(image, &results[0]);
            assert_eq!(image.partition(0).unwrap().start_offset_bytes(), 32256);
            assert_eq!(image.partition(0).unwrap().size_bytes(), 401_605_120);
        }
    }

    #[test]
    fn test_metadata_is_shareable_across_threads() {
        let image = std::sync::Arc::new(read(create_test_image()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|slot| {
                let image = image.clone();
                std::thread::spawn(move || image.partition(slot).unwrap().size_bytes())
            })
            .collect();

        let sizes: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(sizes, vec![401_605_120, 0, 0, 0]);
    }
}
