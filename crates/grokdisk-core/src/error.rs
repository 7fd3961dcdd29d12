//! Partition table error types

use std::io;
use thiserror::Error;

/// The error type for partition table decoding
///
/// Every variant aborts the whole read; no partial table is ever produced.
/// The underlying I/O failure is always available through `source()`.
#[derive(Error, Debug)]
pub enum Error {
    /// The image could not be opened for reading
    #[error("could not open image file '{path}'")]
    OpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The partition table offset could not be reached
    #[error("could not seek partition table at byte {offset} (0x{offset:X})")]
    SeekFailed {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// A partition entry could not be fully read
    #[error("could not read partition entry in slot {slot}")]
    DecodeFailed {
        slot: usize,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for partition table operations
pub type Result<T> = std::result::Result<T, Error>;

/// Payload-free classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OpenFailed,
    SeekFailed,
    DecodeFailed,
}

impl Error {
    /// Create an open failure for the given path
    pub fn open_failed(path: impl Into<String>, source: io::Error) -> Self {
        Error::OpenFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a seek failure for the given absolute offset
    pub fn seek_failed(offset: u64, source: io::Error) -> Self {
        Error::SeekFailed { offset, source }
    }

    /// Create a decode failure for the given table slot
    pub fn decode_failed(slot: usize, source: io::Error) -> Self {
        Error::DecodeFailed { slot, source }
    }

    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OpenFailed { .. } => ErrorKind::OpenFailed,
            Error::SeekFailed { .. } => ErrorKind::SeekFailed,
            Error::DecodeFailed { .. } => ErrorKind::DecodeFailed,
        }
    }

    /// The slot that failed to decode, if this is a decode failure
    pub fn slot(&self) -> Option<usize> {
        match self {
            Error::DecodeFailed { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// The underlying I/O error
    pub fn io_error(&self) -> &io::Error {
        match self {
            Error::OpenFailed { source, .. }
            | Error::SeekFailed { source, .. }
            | Error::DecodeFailed { source, .. } => source,
        }
    }
}
