use flate2::read::DeflateDecoder;
use std::io::Read;

use crate::backend::ArchiveBackend;
use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::stream::SectionReader;
use super::structures::{CompressionMethod, EntryInfo};

/// A ZIP archive whose central directory has been read into memory.
#[derive(Debug)]
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<EntryInfo>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Parse the central directory of `reader`.
    pub fn new(reader: R) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.read_central_directory()?;
        log::debug!(
            "read central directory: {} entries in {} bytes",
            entries.len(),
            parser.size()
        );
        Ok(Self { parser, entries })
    }

    /// Open a decompressing stream over `entry`'s data.
    pub fn entry_stream(&self, entry: &EntryInfo) -> Result<Box<dyn Read + '_>> {
        if entry.is_encrypted() {
            return Err(ArchiveError::Encrypted(entry.file_name.clone()));
        }

        let data_offset = self.parser.data_offset(entry)?;
        let raw = SectionReader::new(self.parser.reader(), data_offset, entry.compressed_size);

        match entry.compression_method {
            CompressionMethod::Stored => Ok(Box::new(raw)),
            CompressionMethod::Deflate => Ok(Box::new(DeflateDecoder::new(raw))),
            CompressionMethod::Unknown(method) => Err(ArchiveError::UnsupportedCompression(method)),
        }
    }
}

impl<R: ReadAt> ArchiveBackend for ZipArchive<R> {
    fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    fn open_entry(&self, index: usize) -> Result<Box<dyn Read + '_>> {
        let entry = self
            .entries
            .get(index)
            .ok_or(ArchiveError::NoCurrentEntry)?;
        self.entry_stream(entry)
    }
}
