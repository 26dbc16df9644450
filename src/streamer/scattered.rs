use std::ops::Range;

use tracing::debug;

use super::{is_separator, read_word_tail};
use crate::source::{ByteRead, ByteSource, Source};

/// Byte window of partition `id` when a file of `file_size` bytes is split
/// into `nb` contiguous chunks. The last partition absorbs the remainder.
pub fn window_for(file_size: u64, id: usize, nb: usize) -> Range<u64> {
    assert!(id < nb, "partition {id} out of range for {nb} partitions");
    let chunk = file_size / nb as u64;
    let start = id as u64 * chunk;
    let end = if id == nb - 1 {
        file_size
    } else {
        start + chunk
    };
    start..end
}

/// One contiguous chunk of the file.
///
/// A word starting at offset `p` belongs to the partition whose window
/// `start..end` satisfies `start < p <= end`; partition 0 also owns `p == 0`.
/// A partition therefore drops the word its window starts in, and finishes
/// the one starting right at its end.
pub struct ScatteredStreamer {
    source: Source,
    skip_fragment: bool,
    finished: bool,
    buffer: Vec<u8>,
}

impl ScatteredStreamer {
    pub(super) fn new(mut source: Source, id: usize, nb: usize) -> Self {
        let window = window_for(source.file_size(), id, nb);
        debug!(partition = id, start = window.start, end = window.end, "scattered window");
        source.set_window(window);
        Self {
            source,
            skip_fragment: id > 0,
            finished: false,
            buffer: Vec::new(),
        }
    }

    pub(super) fn sibling(&self, id: usize, nb: usize) -> Self {
        Self::new(self.source.sibling(), id, nb)
    }

    pub(super) fn file_size(&self) -> u64 {
        self.source.file_size()
    }

    pub(super) fn next_word(&mut self) -> Option<&[u8]> {
        if self.finished {
            return None;
        }

        if self.skip_fragment {
            self.skip_fragment = false;
            // Runs past the window too: the previous partition owns this word.
            loop {
                match self.source.next_byte().byte() {
                    None => return self.finish(),
                    Some(byte) if is_separator(byte) => break,
                    Some(_) => {}
                }
            }
        }

        let first = loop {
            match self.source.next_byte() {
                ByteRead::Byte(byte) if is_separator(byte) => continue,
                ByteRead::Byte(byte) => break byte,
                ByteRead::PastWindow { byte, distance: 1 } if !is_separator(byte) => break byte,
                ByteRead::PastWindow { .. } | ByteRead::EndOfFile => return self.finish(),
            }
        };

        self.buffer.clear();
        self.buffer.push(first);
        read_word_tail(&mut self.source, &mut self.buffer);
        self.buffer[0].make_ascii_lowercase();
        Some(self.buffer.as_slice())
    }

    fn finish(&mut self) -> Option<&[u8]> {
        self.finished = true;
        None
    }
}
