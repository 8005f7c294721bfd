//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header to locate its data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{ArchiveError, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field id
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Low-level ZIP file parser over a random access source.
#[derive(Debug)]
pub struct ZipParser<R: ReadAt> {
    reader: R,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the comment-less position first, then searches backwards
    /// through the largest possible comment for a signature whose
    /// comment length field accounts for exactly the remaining bytes.
    ///
    /// Returns the record and its offset in the source.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(ArchiveError::NotAZip);
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf)?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ArchiveError::NotAZip)
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// The locator sits immediately before the regular EOCD and points at
    /// the ZIP64 record. When data has been prepended to the archive that
    /// pointer is stale, so the record is also looked for directly in front
    /// of the locator.
    ///
    /// Returns the record and its actual offset in the source.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<(Zip64EOCD, u64)> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or(ArchiveError::InvalidHeader("ZIP64 locator"))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let adjacent = locator_offset.checked_sub(Zip64EOCD::MIN_SIZE as u64);
        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        for offset in std::iter::once(locator.eocd64_offset).chain(adjacent) {
            if self.signature_at(offset, Zip64EOCD::SIGNATURE)? {
                self.reader.read_exact_at(offset, &mut eocd64_buf)?;
                return Ok((Zip64EOCD::from_bytes(&eocd64_buf)?, offset));
            }
        }

        Err(ArchiveError::InvalidHeader("ZIP64 end of central directory"))
    }

    /// Whether `signature` is stored at `offset`; false past the end.
    fn signature_at(&self, offset: u64, signature: &[u8]) -> Result<bool> {
        match offset.checked_add(signature.len() as u64) {
            Some(end) if end <= self.size => {}
            _ => return Ok(false),
        }
        let mut buf = [0u8; 4];
        self.reader.read_exact_at(offset, &mut buf[..signature.len()])?;
        Ok(&buf[..signature.len()] == signature)
    }

    /// Work out how far the archive has been shifted by data in front of it.
    ///
    /// Stored offsets are relative to the start of the archive. If the
    /// central directory is not where its offset says, it is assumed to end
    /// right where the end record (`cd_end`) begins, and the difference is
    /// applied to every stored offset.
    fn offset_shift(
        &self,
        cd_offset: u64,
        cd_size: u64,
        cd_end: u64,
        total_entries: u64,
    ) -> Result<u64> {
        let in_bounds = cd_offset
            .checked_add(cd_size)
            .is_some_and(|end| end <= self.size);
        if in_bounds && (total_entries == 0 || self.signature_at(cd_offset, CDFH_SIGNATURE)?) {
            return Ok(0);
        }

        if total_entries > 0
            && let Some(actual) = cd_end.checked_sub(cd_size)
            && actual > cd_offset
            && self.signature_at(actual, CDFH_SIGNATURE)?
        {
            let shift = actual - cd_offset;
            log::debug!("archive starts {shift} bytes into the source");
            return Ok(shift);
        }

        Err(ArchiveError::InvalidHeader("central directory bounds"))
    }

    /// Read every Central Directory entry, in stored order.
    pub fn read_central_directory(&self) -> Result<Vec<EntryInfo>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries, cd_end) = if eocd.is_zip64() {
            let (eocd64, eocd64_offset) = self.read_zip64_eocd(eocd_offset)?;
            (
                eocd64.cd_offset,
                eocd64.cd_size,
                eocd64.total_entries,
                eocd64_offset,
            )
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
                eocd_offset,
            )
        };

        let shift = self.offset_shift(cd_offset, cd_size, cd_end, total_entries)?;

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset + shift, &mut cd_data)?;

        // Never trust the entry count for the allocation size
        let capacity = total_entries.min(cd_size / CDFH_MIN_SIZE as u64);
        let mut entries = Vec::with_capacity(capacity as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            let mut entry = parse_cdfh(&mut cursor)?;
            entry.lfh_offset = entry
                .lfh_offset
                .checked_add(shift)
                .ok_or(ArchiveError::InvalidHeader("local file header offset"))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Offset of the first byte of an entry's compressed data.
    ///
    /// The Local File Header's name and extra field lengths may differ
    /// from the Central Directory copy, so they are read from the LFH.
    pub fn data_offset(&self, entry: &EntryInfo) -> Result<u64> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::InvalidHeader("local file header"));
        }

        let file_name_length = u16::from_le_bytes([lfh_buf[26], lfh_buf[27]]) as u64;
        let extra_field_length = u16::from_le_bytes([lfh_buf[28], lfh_buf[29]]) as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Parse one Central Directory File Header at the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<EntryInfo> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::InvalidHeader("central directory file header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/');

    // ZIP64 fields are present only for header fields saturated to 0xFFFFFFFF,
    // in the order uncompressed, compressed, offset
    let extra_field_end = cursor.position() + extra_field_length as u64;
    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        let field_end = cursor.position() + field_size as u64;

        if header_id == ZIP64_EXTRA_ID {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);
    if cursor.position() > cursor.get_ref().len() as u64 {
        return Err(ArchiveError::InvalidHeader("central directory file header"));
    }

    Ok(EntryInfo {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        flags,
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;

    /// Smallest valid archive: an EOCD with no entries.
    fn empty_archive(comment: &[u8]) -> Vec<u8> {
        let mut raw = Vec::from(EndOfCentralDirectory::SIGNATURE);
        raw.extend_from_slice(&[0u8; 16]);
        raw.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        raw.extend_from_slice(comment);
        raw
    }

    #[test]
    fn finds_eocd_without_comment() {
        let data = empty_archive(b"");
        let parser = ZipParser::new(MemoryReader::new(&data));
        let (eocd, offset) = parser.find_eocd().unwrap();
        assert_eq!(offset, 0);
        assert_eq!(eocd.total_entries, 0);
        assert!(parser.read_central_directory().unwrap().is_empty());
    }

    #[test]
    fn finds_eocd_behind_comment() {
        let mut data = b"junk".to_vec();
        data.extend(empty_archive(b"archive comment"));
        let parser = ZipParser::new(MemoryReader::new(&data));
        let (eocd, offset) = parser.find_eocd().unwrap();
        assert_eq!(offset, 4);
        assert_eq!(eocd.comment_len, 15);
    }

    #[test]
    fn rejects_non_zip_data() {
        let data = vec![0x42u8; 100];
        let parser = ZipParser::new(MemoryReader::new(&data));
        assert!(matches!(parser.find_eocd(), Err(ArchiveError::NotAZip)));

        let tiny = b"PK";
        let parser = ZipParser::new(MemoryReader::new(tiny));
        assert!(matches!(parser.find_eocd(), Err(ArchiveError::NotAZip)));
    }

    /// One stored entry followed by ZIP64 end records, all offsets
    /// relative to the start of the archive.
    fn zip64_archive(name: &[u8], data: &[u8]) -> Vec<u8> {
        let crc = crc32fast::hash(data);
        let mut raw = Vec::from(LFH_SIGNATURE);
        raw.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        raw.extend_from_slice(&crc.to_le_bytes());
        raw.extend_from_slice(&(data.len() as u32).to_le_bytes());
        raw.extend_from_slice(&(data.len() as u32).to_le_bytes());
        raw.extend_from_slice(&(name.len() as u16).to_le_bytes());
        raw.extend_from_slice(&0u16.to_le_bytes());
        raw.extend_from_slice(name);
        raw.extend_from_slice(data);

        let cd_offset = raw.len() as u64;
        raw.extend_from_slice(CDFH_SIGNATURE);
        raw.extend_from_slice(&[20, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        raw.extend_from_slice(&crc.to_le_bytes());
        raw.extend_from_slice(&(data.len() as u32).to_le_bytes());
        raw.extend_from_slice(&(data.len() as u32).to_le_bytes());
        raw.extend_from_slice(&(name.len() as u16).to_le_bytes());
        raw.extend_from_slice(&[0u8; 12]); // extra, comment, disk, attributes
        raw.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        raw.extend_from_slice(name);
        let cd_size = raw.len() as u64 - cd_offset;

        let eocd64_offset = raw.len() as u64;
        raw.extend_from_slice(Zip64EOCD::SIGNATURE);
        raw.extend_from_slice(&44u64.to_le_bytes());
        raw.extend_from_slice(&[45, 0, 45, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        raw.extend_from_slice(&1u64.to_le_bytes());
        raw.extend_from_slice(&1u64.to_le_bytes());
        raw.extend_from_slice(&cd_size.to_le_bytes());
        raw.extend_from_slice(&cd_offset.to_le_bytes());

        raw.extend_from_slice(Zip64EOCDLocator::SIGNATURE);
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&eocd64_offset.to_le_bytes());
        raw.extend_from_slice(&1u32.to_le_bytes());

        raw.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        raw.extend_from_slice(&[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
        raw.extend_from_slice(&[0xFF; 8]);
        raw.extend_from_slice(&0u16.to_le_bytes());
        raw
    }

    #[test]
    fn reads_zip64_end_records() {
        let data = zip64_archive(b"big.bin", b"zip64 payload");
        let parser = ZipParser::new(MemoryReader::new(&data));
        let (eocd, eocd_offset) = parser.find_eocd().unwrap();
        assert!(eocd.is_zip64());
        let (eocd64, _) = parser.read_zip64_eocd(eocd_offset).unwrap();
        assert_eq!(eocd64.total_entries, 1);

        let entries = parser.read_central_directory().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "big.bin");
        assert_eq!(parser.data_offset(&entries[0]).unwrap(), 30 + 7);
    }

    #[test]
    fn zip64_archive_behind_leading_data() {
        let mut data = b"#!/bin/sh\nexec stub\n".to_vec();
        let prefix = data.len() as u64;
        data.extend(zip64_archive(b"big.bin", b"zip64 payload"));

        let parser = ZipParser::new(MemoryReader::new(&data));
        let entries = parser.read_central_directory().unwrap();
        assert_eq!(entries[0].lfh_offset, prefix);
        assert_eq!(parser.data_offset(&entries[0]).unwrap(), prefix + 30 + 7);
    }

    #[test]
    fn rejects_central_directory_past_end() {
        let mut data = empty_archive(b"");
        // one entry, 46 byte directory at offset 0 in a 22 byte file
        data[10..12].copy_from_slice(&1u16.to_le_bytes());
        data[12..16].copy_from_slice(&46u32.to_le_bytes());
        let parser = ZipParser::new(MemoryReader::new(&data));
        assert!(matches!(
            parser.read_central_directory(),
            Err(ArchiveError::InvalidHeader(_))
        ));
    }
}
