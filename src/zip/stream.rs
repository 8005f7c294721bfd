//! Byte streams over a single entry's data.

use crc32fast::Hasher;
use std::io::{self, Read};

use crate::io::ReadAt;

/// Reads the half-open byte range `[pos, end)` of a random access source.
#[derive(Debug)]
pub struct SectionReader<'r, R: ReadAt> {
    source: &'r R,
    pos: u64,
    end: u64,
}

impl<'r, R: ReadAt> SectionReader<'r, R> {
    pub fn new(source: &'r R, offset: u64, len: u64) -> Self {
        Self {
            source,
            pos: offset,
            end: offset.saturating_add(len),
        }
    }
}

impl<R: ReadAt> Read for SectionReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.end.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.source.read_at(self.pos, &mut buf[..want])?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// Passes bytes through while accumulating their CRC-32.
pub struct ChecksumReader<R> {
    inner: R,
    hasher: Hasher,
    read: u64,
}

impl<R: Read> ChecksumReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            read: 0,
        }
    }

    /// Total bytes delivered so far
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// CRC-32 of everything delivered so far
    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.read += n as u64;
        Ok(n)
    }
}
