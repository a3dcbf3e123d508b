//! Archive data source
//!
//! One file opened at startup and only ever read through positioned reads,
//! so every request task can share the same handle without a lock.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Read into `buf` starting at `offset` without moving a shared cursor
pub trait PositionedRead: Send + Sync {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

#[cfg(unix)]
impl PositionedRead for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

// seek_read moves the cursor, but nothing in this crate reads through it
#[cfg(windows)]
impl PositionedRead for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

/// Shared, read-only handle to the archive
///
/// Cloning is cheap: all clones point at the same open file.
#[derive(Clone)]
pub struct ArchiveSource {
    inner: Arc<dyn PositionedRead>,
    size: u64,
}

impl ArchiveSource {
    /// Open the archive file for the lifetime of the process
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self::from_reader(file, size))
    }

    /// Wrap any positioned reader, e.g. an already opened file
    pub fn from_reader(reader: impl PositionedRead + 'static, size: u64) -> Self {
        Self {
            inner: Arc::new(reader),
            size,
        }
    }

    /// Size of the archive in bytes as seen at open time
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Fill `buf` with bytes starting at `offset`.
    ///
    /// Returns the number of bytes read, which is shorter than `buf` only when
    /// the archive ends inside the requested range. Reading a non-empty buffer
    /// at or beyond the end of the archive is an `UnexpectedEof` error.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        let mut pos = offset;

        while filled < buf.len() {
            match self.inner.read_at(pos, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    pos += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        if filled == 0 && !buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("offset {offset} is at or beyond the end of the archive"),
            ));
        }

        Ok(filled)
    }
}

impl fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveSource")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
