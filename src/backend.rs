use std::io::Read;

use crate::error::Result;
use crate::zip::EntryInfo;

/// An opened archive that [`ArchiveReader`](crate::ArchiveReader) can walk.
///
/// Entries are addressed by their index in the archive's native
/// (central directory) order. Backends hold no cursor; the reader does.
pub trait ArchiveBackend {
    /// All entries, in enumeration order
    fn entries(&self) -> &[EntryInfo];

    /// Open a stream yielding the decompressed bytes of entry `index`.
    fn open_entry(&self, index: usize) -> Result<Box<dyn Read + '_>>;

    fn entry_info(&self, index: usize) -> Option<&EntryInfo> {
        self.entries().get(index)
    }

    /// Index of the first entry whose path equals `name`.
    ///
    /// `ignore_case` compares ASCII letters case-insensitively.
    fn locate(&self, name: &str, ignore_case: bool) -> Option<usize> {
        self.entries().iter().position(|entry| {
            if ignore_case {
                entry.file_name.eq_ignore_ascii_case(name)
            } else {
                entry.file_name == name
            }
        })
    }
}
