//! Sequential byte access over a window of one file.
//!
//! A first [`Source`] opens the file; siblings made with [`Source::sibling`]
//! share the opened resource through an `Arc` and only own their cursor.
//! The resource is released when the last holder is dropped, whatever the
//! order in which partitions are torn down.

mod buffered;
mod mapped;

use std::ops::Range;
use std::path::Path;

use tracing::debug;

pub use buffered::BufferedSource;
pub use mapped::MappedSource;

use crate::config::ReaderKind;
use crate::error::{MapReduceError, Result};

/// Outcome of one [`ByteSource::next_byte`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRead {
    /// A byte inside the window.
    Byte(u8),
    /// A byte after the window; `distance` is 1 for the first byte past it.
    PastWindow { byte: u8, distance: u64 },
    /// Nothing left in the file. The cursor does not move.
    EndOfFile,
}

impl ByteRead {
    pub fn byte(&self) -> Option<u8> {
        match *self {
            ByteRead::Byte(byte) | ByteRead::PastWindow { byte, .. } => Some(byte),
            ByteRead::EndOfFile => None,
        }
    }
}

pub trait ByteSource {
    fn file_size(&self) -> u64;

    /// Restrict reads to `window` and move the cursor to its start.
    fn set_window(&mut self, window: Range<u64>);

    fn window(&self) -> Range<u64>;

    /// Offset of the next byte to be read.
    fn offset(&self) -> u64;

    fn next_byte(&mut self) -> ByteRead;
}

#[inline]
pub(crate) fn classify(window: &Range<u64>, at: u64, byte: u8) -> ByteRead {
    if at < window.end {
        ByteRead::Byte(byte)
    } else {
        ByteRead::PastWindow {
            byte,
            distance: at - window.end + 1,
        }
    }
}

/// One of the two backends.
pub enum Source {
    Mapped(MappedSource),
    Buffered(BufferedSource),
}

impl Source {
    /// Open `path` with the selected backend; the window covers the whole file.
    pub fn open(path: &Path, kind: ReaderKind, read_buffer_size: usize) -> Result<Self> {
        let source = match kind {
            ReaderKind::Mmap => MappedSource::open(path).map(Source::Mapped),
            ReaderKind::Read => {
                BufferedSource::open(path, read_buffer_size).map(Source::Buffered)
            }
        }
        .map_err(|err| MapReduceError::file_access(path, err))?;

        debug!(path = %path.display(), ?kind, size = source.file_size(), "opened byte source");
        Ok(source)
    }

    /// A new cursor over the same opened file. Never reopens it.
    pub fn sibling(&self) -> Self {
        match self {
            Source::Mapped(inner) => Source::Mapped(inner.sibling()),
            Source::Buffered(inner) => Source::Buffered(inner.sibling()),
        }
    }

    pub fn kind(&self) -> ReaderKind {
        match self {
            Source::Mapped(_) => ReaderKind::Mmap,
            Source::Buffered(_) => ReaderKind::Read,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Source::Mapped(inner) => inner.path(),
            Source::Buffered(inner) => inner.path(),
        }
    }

    /// Number of live sources sharing the opened file.
    pub fn holders(&self) -> usize {
        match self {
            Source::Mapped(inner) => inner.holders(),
            Source::Buffered(inner) => inner.holders(),
        }
    }
}

impl ByteSource for Source {
    fn file_size(&self) -> u64 {
        match self {
            Source::Mapped(inner) => inner.file_size(),
            Source::Buffered(inner) => inner.file_size(),
        }
    }

    fn set_window(&mut self, window: Range<u64>) {
        match self {
            Source::Mapped(inner) => inner.set_window(window),
            Source::Buffered(inner) => inner.set_window(window),
        }
    }

    fn window(&self) -> Range<u64> {
        match self {
            Source::Mapped(inner) => inner.window(),
            Source::Buffered(inner) => inner.window(),
        }
    }

    fn offset(&self) -> u64 {
        match self {
            Source::Mapped(inner) => inner.offset(),
            Source::Buffered(inner) => inner.offset(),
        }
    }

    #[inline]
    fn next_byte(&mut self) -> ByteRead {
        match self {
            Source::Mapped(inner) => inner.next_byte(),
            Source::Buffered(inner) => inner.next_byte(),
        }
    }
}
