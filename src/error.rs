use std::io;
use thiserror::Error;

/// Errors produced while opening an archive or extracting an entry.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a valid ZIP file")]
    NotAZip,
    #[error("Invalid {0}")]
    InvalidHeader(&'static str),
    #[error("Input buffer of {0} bytes exceeds the {max} byte limit", max = i32::MAX)]
    BufferTooLarge(usize),
    #[error("No archive is open")]
    NotOpen,
    #[error("Cursor is not positioned on an entry")]
    NoCurrentEntry,
    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),
    #[error("Entry {0} is encrypted")]
    Encrypted(String),
    #[error("Requested {requested} bytes but the entry holds {available}")]
    RequestTooLarge { requested: u64, available: u64 },
    #[error("Entry stream ended after {read} of {expected} bytes")]
    ShortRead { expected: u64, read: u64 },
    #[error("CRC-32 mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
