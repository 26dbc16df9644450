//! Chunked bump allocator for word spellings.
//!
//! Memory is reserved in fixed-size chunks and handed out front to back.
//! Nothing is freed individually: every chunk lives until the arena is
//! dropped. Allocations are addressed through copyable [`Span`] handles
//! rather than references, so the owner of an arena can keep handles next
//! to it without borrowing it.

use crate::config::ARENA_CHUNK_SIZE;

/// Location of one allocation inside an [`Arena`].
///
/// Only meaningful for the arena that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    chunk: u32,
    start: u32,
    len: u32,
}

impl Span {
    pub fn chunk(&self) -> usize {
        self.chunk as usize
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start() + self.len()
    }

    /// True when both spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.chunk == other.chunk && self.start() < other.end() && other.start() < self.end()
    }
}

struct Chunk {
    data: Box<[u8]>,
    used: usize,
}

impl Chunk {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
            used: 0,
        }
    }

    fn free(&self) -> usize {
        self.data.len() - self.used
    }

    fn bump(&mut self, size: usize) -> Option<usize> {
        if self.free() < size {
            return None;
        }
        let start = self.used;
        self.used += size;
        Some(start)
    }
}

pub struct Arena {
    chunk_size: usize,
    // Oldest first; lookups walk it backwards so the newest chunk is tried first.
    chunks: Vec<Chunk>,
    allocated: usize,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(ARENA_CHUNK_SIZE)
    }
}

impl Arena {
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "arena chunk size must be positive");
        assert!(
            chunk_size <= u32::MAX as usize,
            "arena chunk size {chunk_size} does not fit a span"
        );
        Self {
            chunk_size,
            chunks: Vec::new(),
            allocated: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes handed out so far.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }

    /// Bytes reserved by all chunks, used or not.
    pub fn reserved_bytes(&self) -> usize {
        self.chunks.len() * self.chunk_size
    }

    /// Reserve `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds the chunk size.
    pub fn allocate(&mut self, size: usize) -> Span {
        assert!(
            size <= self.chunk_size,
            "arena allocation of {size} bytes exceeds chunk size {}",
            self.chunk_size
        );

        for (index, chunk) in self.chunks.iter_mut().enumerate().rev() {
            if let Some(start) = chunk.bump(size) {
                self.allocated += size;
                return Self::span(index, start, size);
            }
        }

        let mut chunk = Chunk::new(self.chunk_size);
        let start = chunk.bump(size).unwrap_or(0);
        self.chunks.push(chunk);
        self.allocated += size;
        Self::span(self.chunks.len() - 1, start, size)
    }

    /// Copy `bytes` into a fresh allocation.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Span {
        let span = self.allocate(bytes.len());
        self.get_mut(span).copy_from_slice(bytes);
        span
    }

    pub fn get(&self, span: Span) -> &[u8] {
        &self.chunks[span.chunk()].data[span.start()..span.end()]
    }

    pub fn get_mut(&mut self, span: Span) -> &mut [u8] {
        &mut self.chunks[span.chunk()].data[span.start()..span.end()]
    }

    fn span(chunk: usize, start: usize, len: usize) -> Span {
        Span {
            chunk: chunk as u32,
            start: start as u32,
            len: len as u32,
        }
    }
}
