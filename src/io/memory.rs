use super::ReadAt;
use std::io;

/// Random access over a borrowed, caller-owned byte buffer.
///
/// Nothing is copied; the buffer must outlive the reader, which the
/// lifetime parameter enforces.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReader<'a> {
    data: &'a [u8],
}

impl<'a> MemoryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ReadAt for MemoryReader<'_> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = match usize::try_from(offset) {
            Ok(start) if start < self.data.len() => start,
            _ => return Ok(0),
        };
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
