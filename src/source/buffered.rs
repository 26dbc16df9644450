use std::fs::File;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{classify, ByteRead, ByteSource};

struct SharedFile {
    path: PathBuf,
    file: File,
    size: u64,
}

/// Byte source reading through a private buffer.
///
/// All siblings share one descriptor. Reads are positional, so no sibling
/// ever moves a file offset another one depends on.
pub struct BufferedSource {
    shared: Arc<SharedFile>,
    buffer: Box<[u8]>,
    // File offset of buffer[0] and number of valid bytes.
    buffer_start: u64,
    buffer_len: usize,
    window: Range<u64>,
    offset: u64,
}

impl BufferedSource {
    pub fn open(path: &Path, buffer_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let shared = Arc::new(SharedFile {
            path: path.to_path_buf(),
            file,
            size,
        });
        Ok(Self::with_shared(shared, buffer_size))
    }

    fn with_shared(shared: Arc<SharedFile>, buffer_size: usize) -> Self {
        let size = shared.size;
        Self {
            shared,
            buffer: vec![0u8; buffer_size.max(1)].into_boxed_slice(),
            buffer_start: 0,
            buffer_len: 0,
            window: 0..size,
            offset: 0,
        }
    }

    pub fn sibling(&self) -> Self {
        Self::with_shared(Arc::clone(&self.shared), self.buffer.len())
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    fn buffered(&self, at: u64) -> Option<u8> {
        let rel = at.checked_sub(self.buffer_start)?;
        if rel < self.buffer_len as u64 {
            Some(self.buffer[rel as usize])
        } else {
            None
        }
    }

    fn refill(&mut self, at: u64) {
        let wanted = ((self.shared.size - at) as usize).min(self.buffer.len());
        let mut filled = 0;
        while filled < wanted {
            match read_at(&self.shared.file, &mut self.buffer[filled..wanted], at + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => panic!(
                    "read of '{}' at offset {} failed: {err}",
                    self.shared.path.display(),
                    at + filled as u64
                ),
            }
        }
        self.buffer_start = at;
        self.buffer_len = filled;
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

impl ByteSource for BufferedSource {
    fn file_size(&self) -> u64 {
        self.shared.size
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

    fn next_byte(&mut self) -> ByteRead {
        let at = self.offset;
        if at >= self.shared.size {
            return ByteRead::EndOfFile;
        }
        let byte = match self.buffered(at) {
            Some(byte) => byte,
            None => {
                self.refill(at);
                match self.buffered(at) {
                    Some(byte) => byte,
                    // File shrank underneath us.
                    None => return ByteRead::EndOfFile,
                }
            }
        };
        self.offset += 1;
        classify(&self.window, at, byte)
    }
}
