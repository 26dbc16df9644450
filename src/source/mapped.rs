use std::fs::File;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;

use super::{classify, ByteRead, ByteSource};

struct Mapping {
    path: PathBuf,
    // Zero-length files cannot be mapped on every platform.
    map: Option<Mmap>,
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

/// Byte source backed by one read-only mapping shared by all siblings.
pub struct MappedSource {
    shared: Arc<Mapping>,
    window: Range<u64>,
    offset: u64,
}

impl MappedSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        let map = if size == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and the file is not written
            // by this process while it is alive.
            let map = unsafe { Mmap::map(&file)? };
            advise_sequential(&map);
            Some(map)
        };

        Ok(Self {
            shared: Arc::new(Mapping {
                path: path.to_path_buf(),
                map,
            }),
            window: 0..size,
            offset: 0,
        })
    }

    pub fn sibling(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            window: 0..self.file_size(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.shared)
    }
}

#[cfg(unix)]
fn advise_sequential(map: &Mmap) {
    if let Err(err) = map.advise(memmap2::Advice::Sequential) {
        tracing::debug!(%err, "madvise(SEQUENTIAL) rejected");
    }
}

#[cfg(not(unix))]
fn advise_sequential(_map: &Mmap) {}

impl ByteSource for MappedSource {
    fn file_size(&self) -> u64 {
        self.shared.bytes().len() as u64
    }

    fn set_window(&mut self, window: Range<u64>) {
        self.offset = window.start;
        self.window = window;
    }

    fn window(&self) -> Range<u64> {
        self.window.clone()
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    fn next_byte(&mut self) -> ByteRead {
        let at = self.offset;
        match self.shared.bytes().get(at as usize) {
            Some(&byte) => {
                self.offset += 1;
                classify(&self.window, at, byte)
            }
            None => ByteRead::EndOfFile,
        }
    }
}
