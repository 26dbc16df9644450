//! Word counts in 256×256 hash buckets with sorted chains.
//!
//! A word hashes on its first two bytes (`b0 * 256 + b1`, or `b0 * 256` for
//! a one-byte word). Each bucket chain is kept ordered by the bytes after
//! those two, so a full walk yields words grouped by bucket and ordered by
//! suffix inside a bucket. That order is what [`Dictionary::iter`] and
//! [`Dictionary::write_to`] expose; [`Dictionary::sorted_entries`] is the
//! fully alphabetical alternative.

use std::cmp::Ordering;
use std::io::{self, Write};
use std::time::Duration;

use crate::arena::{Arena, Span};
use crate::config::{Config, HASH_CHARS_USED, HASH_CHAR_SIZE, HASH_SIZE};
use crate::profile::Stopwatch;

enum Spelling {
    Arena(Span),
    Heap(Box<[u8]>),
}

struct Record {
    spelling: Spelling,
    count: u64,
    next: Option<u32>,
}

/// Bucket index of `word`.
#[inline]
pub fn hash(word: &[u8]) -> usize {
    match word {
        [] => 0,
        [first] => *first as usize * HASH_CHAR_SIZE,
        [first, second, ..] => *first as usize * HASH_CHAR_SIZE + *second as usize,
    }
}

/// Order of two words sharing a bucket: bytes after the hashed prefix,
/// shorter first, then the full spelling.
fn chain_order(a: &[u8], b: &[u8]) -> Ordering {
    suffix(a).cmp(suffix(b)).then_with(|| a.cmp(b))
}

fn suffix(word: &[u8]) -> &[u8] {
    word.get(HASH_CHARS_USED..).unwrap_or(&[])
}

pub struct Dictionary {
    buckets: Vec<Option<u32>>,
    records: Vec<Record>,
    arena: Option<Arena>,
    total: u64,
    timer: Stopwatch,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new(&Config::default(), false)
    }
}

impl Dictionary {
    pub fn new(config: &Config, profiling: bool) -> Self {
        Self {
            buckets: vec![None; HASH_SIZE],
            records: Vec::new(),
            arena: config.use_arena.then(|| Arena::new(config.arena_chunk_size)),
            total: 0,
            timer: Stopwatch::new(profiling),
        }
    }

    /// Count one more occurrence of `word`.
    pub fn put(&mut self, word: &[u8]) {
        let started = self.timer.start();
        self.add(word, 1);
        self.timer.stop(started);
    }

    /// Occurrences of `word`; 0 if it was never put.
    pub fn count(&self, word: &[u8]) -> u64 {
        let mut cursor = self.buckets[hash(word)];
        while let Some(index) = cursor {
            let record = &self.records[index as usize];
            if self.spelling(record) == word {
                return record.count;
            }
            cursor = record.next;
        }
        0
    }

    /// Add every count of `other` into `self`. `other` is left as is.
    pub fn merge(&mut self, other: &Dictionary) {
        for (word, count) in other.iter() {
            self.add(word, count);
        }
    }

    /// Distinct words.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn uses_arena(&self) -> bool {
        self.arena.is_some()
    }

    /// Time spent in `put`; zero unless profiling.
    pub fn put_time(&self) -> Duration {
        self.timer.elapsed()
    }

    /// `(word, count)` in bucket order, then chain order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            dictionary: self,
            bucket: 0,
            cursor: None,
        }
    }

    /// Entries sorted by full spelling.
    pub fn sorted_entries(&self) -> Vec<(&[u8], u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// One `word=count` line per entry, in iteration order.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        write_entries(self.iter(), out)
    }

    fn spelling<'a>(&'a self, record: &'a Record) -> &'a [u8] {
        match &record.spelling {
            Spelling::Heap(bytes) => &bytes[..],
            Spelling::Arena(span) => match &self.arena {
                Some(arena) => arena.get(*span),
                None => unreachable!("arena spelling without an arena"),
            },
        }
    }

    fn store(&mut self, word: &[u8]) -> Spelling {
        match &mut self.arena {
            Some(arena) if word.len() <= arena.chunk_size() => {
                Spelling::Arena(arena.alloc_bytes(word))
            }
            _ => Spelling::Heap(word.into()),
        }
    }

    fn add(&mut self, word: &[u8], count: u64) {
        let bucket = hash(word);
        let mut previous: Option<u32> = None;
        let mut cursor = self.buckets[bucket];

        while let Some(index) = cursor {
            let record = &self.records[index as usize];
            match chain_order(word, self.spelling(record)) {
                Ordering::Less => break,
                Ordering::Equal => {
                    self.records[index as usize].count += count;
                    self.total += count;
                    return;
                }
                Ordering::Greater => {
                    previous = cursor;
                    cursor = record.next;
                }
            }
        }

        let index = self.records.len();
        assert!(index < u32::MAX as usize, "dictionary record limit reached");
        let index = index as u32;

        let spelling = self.store(word);
        self.records.push(Record {
            spelling,
            count,
            next: cursor,
        });
        match previous {
            Some(previous) => self.records[previous as usize].next = Some(index),
            None => self.buckets[bucket] = Some(index),
        }
        self.total += count;
    }
}

/// Write `word=count` lines.
pub fn write_entries<'a>(
    entries: impl IntoIterator<Item = (&'a [u8], u64)>,
    out: &mut impl Write,
) -> io::Result<()> {
    for (word, count) in entries {
        out.write_all(word)?;
        writeln!(out, "={count}")?;
    }
    Ok(())
}

pub struct Iter<'a> {
    dictionary: &'a Dictionary,
    bucket: usize,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], u64);

    fn next(&mut self) -> Option<Self::Item> {
        let dictionary = self.dictionary;
        while self.cursor.is_none() {
            if self.bucket >= dictionary.buckets.len() {
                return None;
            }
            self.cursor = dictionary.buckets[self.bucket];
            self.bucket += 1;
        }

        let index = self.cursor?;
        let record = &dictionary.records[index as usize];
        self.cursor = record.next;
        Some((dictionary.spelling(record), record.count))
    }
}
