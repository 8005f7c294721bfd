use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::backend::ArchiveBackend;
use crate::error::{ArchiveError, Result};
use crate::io::{LocalFileReader, MemoryReader};
use crate::path;
use crate::zip::{ChecksumReader, EntryInfo, ZipArchive};

/// Largest in-memory archive accepted by [`ArchiveReader::open_buffer`].
pub const MAX_BUFFER_LEN: usize = i32::MAX as usize;

/// Largest request handed to a single `read` call during extraction.
const MAX_CHUNK: usize = i32::MAX as usize;

/// Reader configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Check the CRC-32 of entries that are extracted in full.
    pub verify_checksums: bool,
    /// Decides [`ArchiveReader::current_entry_is_visible`]; invisible
    /// entries are skipped by extension lookup.
    pub visibility: fn(&str) -> bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            visibility: path::always_visible,
        }
    }
}

struct Bound<'a> {
    archive: Box<dyn ArchiveBackend + 'a>,
    cursor: Option<usize>,
}

/// A cursor over the entries of one ZIP archive.
///
/// The reader starts unbound. [`open`](Self::open) or
/// [`open_buffer`](Self::open_buffer) binds it to an archive, the `seek_*`
/// methods move the cursor, and [`unzip_current_entry`](Self::unzip_current_entry)
/// extracts whatever the cursor points at. Dropping the reader releases the
/// archive.
///
/// ```no_run
/// use zipwrapped::ArchiveReader;
///
/// let mut reader = ArchiveReader::new();
/// reader.open("assets.zip")?;
/// if reader.seek_file_entry_with_extension("png") {
///     let data = reader.read_current_entry()?;
///     println!("{}: {} bytes", reader.current_entry_path(), data.len());
/// }
/// # Ok::<(), zipwrapped::ArchiveError>(())
/// ```
pub struct ArchiveReader<'a> {
    bound: Option<Bound<'a>>,
    current_path: String,
    options: ReaderOptions,
}

impl Default for ArchiveReader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArchiveReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("open", &self.is_open())
            .field("entries", &self.len())
            .field("current_path", &self.current_path)
            .field("options", &self.options)
            .finish()
    }
}

impl<'a> ArchiveReader<'a> {
    /// An unbound reader with default options.
    pub fn new() -> Self {
        Self::with_options(ReaderOptions::default())
    }

    /// An unbound reader that checks checksums and visibility as `options`
    /// says.
    pub fn with_options(options: ReaderOptions) -> Self {
        Self {
            bound: None,
            current_path: String::new(),
            options,
        }
    }

    /// Open a ZIP file from the filesystem.
    ///
    /// Any archive already open is closed first. On failure the reader is
    /// left unbound.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.close();
        let path = path.as_ref();
        let archive = ZipArchive::new(LocalFileReader::new(path)?)?;
        log::debug!("opened {}", path.display());
        self.bind(Box::new(archive));
        Ok(())
    }

    /// Open a ZIP image held in memory.
    ///
    /// The buffer is borrowed, not copied, and must stay alive as long as
    /// the reader. Buffers longer than [`MAX_BUFFER_LEN`] are rejected
    /// before any parsing.
    pub fn open_buffer(&mut self, buffer: &'a [u8]) -> Result<()> {
        self.close();
        check_buffer_len(buffer.len())?;
        let archive = ZipArchive::new(MemoryReader::new(buffer))?;
        log::debug!("opened {} byte buffer", buffer.len());
        self.bind(Box::new(archive));
        Ok(())
    }

    /// Bind an already opened backend.
    pub fn open_backend(&mut self, archive: Box<dyn ArchiveBackend + 'a>) {
        self.close();
        self.bind(archive);
    }

    fn bind(&mut self, archive: Box<dyn ArchiveBackend + 'a>) {
        self.bound = Some(Bound {
            archive,
            cursor: None,
        });
    }

    /// Release the archive and forget the current entry. Safe to call on
    /// a reader that is not open.
    pub fn close(&mut self) {
        if self.bound.take().is_some() {
            log::debug!("closed archive");
        }
        self.current_path.clear();
    }

    /// Whether an archive is bound.
    pub fn is_open(&self) -> bool {
        self.bound.is_some()
    }

    /// Number of entries in the open archive; zero when unbound.
    pub fn len(&self) -> usize {
        self.bound.as_ref().map_or(0, |b| b.archive.entries().len())
    }

    /// True when unbound or when the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry of the open archive, in enumeration order.
    pub fn entries(&self) -> impl Iterator<Item = &EntryInfo> + '_ {
        self.bound
            .iter()
            .flat_map(|b| b.archive.entries().iter())
    }

    /// Move the cursor to the first entry.
    pub fn seek_first_entry(&mut self) -> bool {
        self.seek_to(|_| Some(0))
    }

    /// Advance the cursor. Returns false at the end of the archive or when
    /// the cursor was never positioned; the cursor does not move then.
    pub fn seek_next_entry(&mut self) -> bool {
        self.seek_to(|b| b.cursor.map(|i| i + 1))
    }

    /// Move the cursor to the entry whose full path is `name`.
    pub fn seek_file_entry_with_name(&mut self, name: &str, ignore_case: bool) -> bool {
        self.seek_to(|b| b.archive.locate(name, ignore_case))
    }

    /// Scan from the first entry for a visible file whose extension is
    /// `extension`, ignoring case. A leading dot on `extension` is optional.
    ///
    /// When nothing matches the cursor is left on the last entry.
    pub fn seek_file_entry_with_extension(&mut self, extension: &str) -> bool {
        if !self.seek_first_entry() {
            return false;
        }
        loop {
            if self.current_entry_is_file()
                && self.current_entry_is_visible()
                && path::has_extension(self.current_entry_name(), extension)
            {
                return true;
            }
            if !self.seek_next_entry() {
                return false;
            }
        }
    }

    fn seek_to(&mut self, target: impl FnOnce(&Bound<'a>) -> Option<usize>) -> bool {
        let Some(bound) = self.bound.as_mut() else {
            return false;
        };
        let Some(index) = target(&*bound) else {
            return false;
        };
        let Some(entry) = bound.archive.entry_info(index) else {
            return false;
        };

        self.current_path.clone_from(&entry.file_name);
        bound.cursor = Some(index);
        log::trace!("cursor at #{index} {}", self.current_path);
        true
    }

    /// Central directory record of the current entry.
    pub fn current_entry(&self) -> Option<&EntryInfo> {
        let bound = self.bound.as_ref()?;
        bound.archive.entry_info(bound.cursor?)
    }

    /// Full path of the current entry; empty before the first seek.
    pub fn current_entry_path(&self) -> &str {
        &self.current_path
    }

    /// Current path up to, not including, its last `/`; empty when the
    /// path has no `/`.
    pub fn current_entry_folder(&self) -> &str {
        path::folder(&self.current_path)
    }

    /// Last `/` component of the current path; empty for directory markers.
    pub fn current_entry_name(&self) -> &str {
        path::name(&self.current_path)
    }

    /// False for directory markers and when no entry is current.
    pub fn current_entry_is_file(&self) -> bool {
        !self.current_entry_name().is_empty()
    }

    /// Result of the visibility predicate for the current path, false when
    /// no entry is current.
    pub fn current_entry_is_visible(&self) -> bool {
        self.current_entry().is_some() && (self.options.visibility)(&self.current_path)
    }

    /// Decompressed size of the current entry, if there is one.
    pub fn uncompressed_size(&self) -> Option<u64> {
        self.current_entry().map(|entry| entry.uncompressed_size)
    }

    /// Decompress the first `buf.len()` bytes of the current entry into `buf`.
    ///
    /// Returns the number of bytes written, which always equals `buf.len()`.
    /// Asking for more than the entry holds is an error. The entry stream
    /// never outlives this call.
    pub fn unzip_current_entry(&mut self, buf: &mut [u8]) -> Result<usize> {
        let bound = self.bound.as_ref().ok_or(ArchiveError::NotOpen)?;
        let index = bound.cursor.ok_or(ArchiveError::NoCurrentEntry)?;
        let entry = bound
            .archive
            .entry_info(index)
            .ok_or(ArchiveError::NoCurrentEntry)?;

        let requested = buf.len() as u64;
        if requested > entry.uncompressed_size {
            return Err(ArchiveError::RequestTooLarge {
                requested,
                available: entry.uncompressed_size,
            });
        }

        let mut stream = ChecksumReader::new(bound.archive.open_entry(index)?);
        let mut filled = 0;
        while filled < buf.len() {
            let chunk = (buf.len() - filled).min(MAX_CHUNK);
            match stream.read(&mut buf[filled..filled + chunk]) {
                Ok(0) => {
                    return Err(ArchiveError::ShortRead {
                        expected: requested,
                        read: filled as u64,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if self.options.verify_checksums && stream.bytes_read() == entry.uncompressed_size {
            let actual = stream.checksum();
            if actual != entry.crc32 {
                log::warn!("{}: CRC-32 mismatch", entry.file_name);
                return Err(ArchiveError::ChecksumMismatch {
                    expected: entry.crc32,
                    actual,
                });
            }
        }

        Ok(filled)
    }

    /// Extract the whole current entry into a new buffer.
    pub fn read_current_entry(&mut self) -> Result<Vec<u8>> {
        let size = self.uncompressed_size().ok_or(ArchiveError::NoCurrentEntry)?;
        let len = usize::try_from(size).map_err(|_| ArchiveError::RequestTooLarge {
            requested: size,
            available: usize::MAX as u64,
        })?;
        let mut data = vec![0u8; len];
        self.unzip_current_entry(&mut data)?;
        Ok(data)
    }
}

fn check_buffer_len(len: usize) -> Result<()> {
    if len > MAX_BUFFER_LEN {
        return Err(ArchiveError::BufferTooLarge(len));
    }
    Ok(())
}
