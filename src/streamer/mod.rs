//! Word streams over one partition of a file.
//!
//! `N` cooperating [`Wordstreamer`]s split a file so that every word in it
//! is produced by exactly one of them. The first one opens the file; the
//! others are derived from it with [`Wordstreamer::create_another`] and
//! share the opened resource.
//!
//! Tokens are maximal runs of bytes that are neither ASCII punctuation nor
//! ASCII whitespace (vertical tab included). Only the first byte of each
//! token is lower-cased.

mod interleaved;
mod scattered;

use std::path::Path;
use std::time::Duration;

use tracing::debug;

pub use interleaved::InterleavedStreamer;
pub use scattered::{window_for, ScatteredStreamer};

use crate::config::{Config, Strategy};
use crate::error::Result;
use crate::profile::Stopwatch;
use crate::source::{ByteSource, Source};

const VERTICAL_TAB: u8 = 0x0B;

#[inline]
pub fn is_separator(byte: u8) -> bool {
    byte.is_ascii_punctuation() || byte.is_ascii_whitespace() || byte == VERTICAL_TAB
}

/// Append word bytes to `buffer` until a separator (consumed) or end of file.
fn read_word_tail(source: &mut impl ByteSource, buffer: &mut Vec<u8>) {
    while let Some(byte) = source.next_byte().byte() {
        if is_separator(byte) {
            break;
        }
        buffer.push(byte);
    }
}

/// Read the next whole token into `buffer`, ignoring windows.
/// Returns false once the file is exhausted.
fn read_token(source: &mut impl ByteSource, buffer: &mut Vec<u8>) -> bool {
    buffer.clear();
    let first = loop {
        match source.next_byte().byte() {
            None => return false,
            Some(byte) if is_separator(byte) => continue,
            Some(byte) => break byte,
        }
    };
    buffer.push(first.to_ascii_lowercase());
    read_word_tail(source, buffer);
    true
}

enum Partition {
    Scattered(ScatteredStreamer),
    Interleaved(InterleavedStreamer),
}

pub struct Wordstreamer {
    id: usize,
    nb_streamers: usize,
    strategy: Strategy,
    partition: Partition,
    timer: Stopwatch,
    words: u64,
}

impl Wordstreamer {
    /// Open `path` and build partition 0 of `nb_streamers`.
    pub fn create_first(
        path: &Path,
        nb_streamers: usize,
        strategy: Strategy,
        config: &Config,
        profiling: bool,
    ) -> Result<Self> {
        assert!(nb_streamers > 0, "at least one partition is required");

        let source = Source::open(path, config.reader, config.read_buffer_size)?;
        let partition = match strategy {
            Strategy::Scattered => {
                Partition::Scattered(ScatteredStreamer::new(source, 0, nb_streamers))
            }
            Strategy::Interleaved => {
                Partition::Interleaved(InterleavedStreamer::new(source, nb_streamers))
            }
        };
        debug!(?strategy, nb_streamers, "created first word streamer");

        Ok(Self {
            id: 0,
            nb_streamers,
            strategy,
            partition,
            timer: Stopwatch::new(profiling),
            words: 0,
        })
    }

    /// Build partition `id` over the file already opened by `self`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is 0 or not below the partition count.
    pub fn create_another(&self, id: usize) -> Self {
        assert!(
            id > 0 && id < self.nb_streamers,
            "streamer id {id} must be in 1..{}",
            self.nb_streamers
        );

        let partition = match &self.partition {
            Partition::Scattered(first) => {
                Partition::Scattered(first.sibling(id, self.nb_streamers))
            }
            Partition::Interleaved(first) => Partition::Interleaved(first.sibling(id)),
        };

        Self {
            id,
            nb_streamers: self.nb_streamers,
            strategy: self.strategy,
            partition,
            timer: Stopwatch::new(self.timer.is_enabled()),
            words: 0,
        }
    }

    /// Next word of this partition, or `None` once it is exhausted.
    /// Every call after the first `None` returns `None` again.
    pub fn next_word(&mut self) -> Option<&[u8]> {
        let started = self.timer.start();
        let word = match &mut self.partition {
            Partition::Scattered(inner) => inner.next_word(),
            Partition::Interleaved(inner) => inner.next_word(),
        };
        self.timer.stop(started);
        if word.is_some() {
            self.words += 1;
        }
        word
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn nb_streamers(&self) -> usize {
        self.nb_streamers
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn file_size(&self) -> u64 {
        match &self.partition {
            Partition::Scattered(inner) => inner.file_size(),
            Partition::Interleaved(inner) => inner.file_size(),
        }
    }

    /// Words produced so far.
    pub fn words_emitted(&self) -> u64 {
        self.words
    }

    /// Time spent in `next_word`; zero unless profiling.
    pub fn get_time(&self) -> Duration {
        self.timer.elapsed()
    }
}
