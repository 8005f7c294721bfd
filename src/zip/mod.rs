//! The built-in ZIP backend.
//!
//! [`ZipArchive`] reads an archive's index once, when it is opened, and
//! decodes entry data only when the reader asks for it. It implements
//! [`ArchiveBackend`](crate::ArchiveBackend).
//!
//! Layout on disk, from the front: a local header plus data for every
//! entry, then the central directory (one record per entry), then the end
//! of central directory record. Parsing starts from the end record, so
//! listing an archive touches only its tail.
//!
//! Handled: STORED and DEFLATE entries, ZIP64 sizes and offsets, archive
//! comments. Refused: encrypted entries and any other compression method.
//! Multi-disk archives are not supported.

mod archive;
mod parser;
mod stream;
mod structures;

pub use archive::ZipArchive;
pub use parser::ZipParser;
pub use stream::{ChecksumReader, SectionReader};
pub use structures::*;
