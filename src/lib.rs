//! # zipwrapped
//!
//! A small cursor-style reader for ZIP archives.
//!
//! An [`ArchiveReader`] is opened on a file or on a borrowed in-memory
//! buffer, positioned on an entry by walking the archive, by exact path, or
//! by file extension, and then asked to decompress that entry into a caller
//! supplied buffer.
//!
//! ## Features
//!
//! - Open from a filesystem path or a borrowed byte slice (no copy)
//! - Entry enumeration in central directory order
//! - Case-sensitive or case-insensitive path lookup
//! - First-visible-file-by-extension lookup
//! - STORED and DEFLATE entries, ZIP64 archives, CRC-32 verification
//!
//! ## Example
//!
//! ```no_run
//! use zipwrapped::ArchiveReader;
//!
//! let bytes = std::fs::read("textures.zip")?;
//! let mut reader = ArchiveReader::new();
//! reader.open_buffer(&bytes)?;
//!
//! let mut more = reader.seek_first_entry();
//! while more {
//!     if reader.current_entry_is_file() {
//!         let mut data = vec![0u8; reader.uncompressed_size().unwrap_or(0) as usize];
//!         reader.unzip_current_entry(&mut data)?;
//!         println!("{} ({} bytes)", reader.current_entry_path(), data.len());
//!     }
//!     more = reader.seek_next_entry();
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod cli;
pub mod error;
pub mod io;
pub mod path;
pub mod reader;
pub mod zip;

pub use backend::ArchiveBackend;
pub use cli::Cli;
pub use error::ArchiveError;
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use reader::{ArchiveReader, MAX_BUFFER_LEN, ReaderOptions};
pub use zip::{CompressionMethod, EntryInfo, ZipArchive};
