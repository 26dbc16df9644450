use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::read_token;
use crate::source::{ByteSource, Source};

/// Single token cursor over the whole file, demultiplexed per partition.
struct SharedCursor {
    source: Source,
    position: u64,
    exhausted: bool,
    // Tokens read on behalf of a partition that has not asked for them yet.
    pending: Vec<VecDeque<Vec<u8>>>,
}

/// Owns every token whose 0-based position modulo `nb` equals `id`.
///
/// Whichever partition holds the lock advances the cursor and parks other
/// partitions' tokens in their queue, so partitions may be polled in any
/// order, from any thread.
pub struct InterleavedStreamer {
    shared: Arc<Mutex<SharedCursor>>,
    id: usize,
    nb: usize,
    finished: bool,
    buffer: Vec<u8>,
}

impl InterleavedStreamer {
    pub(super) fn new(source: Source, nb: usize) -> Self {
        let cursor = SharedCursor {
            source,
            position: 0,
            exhausted: false,
            pending: (0..nb).map(|_| VecDeque::new()).collect(),
        };
        Self {
            shared: Arc::new(Mutex::new(cursor)),
            id: 0,
            nb,
            finished: false,
            buffer: Vec::new(),
        }
    }

    pub(super) fn sibling(&self, id: usize) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            id,
            nb: self.nb,
            finished: false,
            buffer: Vec::new(),
        }
    }

    pub(super) fn file_size(&self) -> u64 {
        self.shared.lock().source.file_size()
    }

    pub(super) fn next_word(&mut self) -> Option<&[u8]> {
        if self.finished {
            return None;
        }

        let mut guard = self.shared.lock();
        let cursor = &mut *guard;
        loop {
            if let Some(word) = cursor.pending[self.id].pop_front() {
                self.buffer = word;
                return Some(self.buffer.as_slice());
            }
            if cursor.exhausted {
                self.finished = true;
                return None;
            }
            if !read_token(&mut cursor.source, &mut self.buffer) {
                cursor.exhausted = true;
                continue;
            }

            let owner = (cursor.position % self.nb as u64) as usize;
            cursor.position += 1;
            if owner == self.id {
                return Some(self.buffer.as_slice());
            }
            cursor.pending[owner].push_back(std::mem::take(&mut self.buffer));
        }
    }
}
