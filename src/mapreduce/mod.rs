//! Map/reduce word count over one file.
//!
//! [`MapReduce::new`] builds one ([`Wordstreamer`], [`Dictionary`]) pair per
//! worker. [`MapReduce::map`] drains every streamer into its own dictionary
//! and returns once all workers are done. [`MapReduce::reduce`] folds every
//! dictionary into the first one and writes the table.

mod parallel;
mod sequential;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{Config, Mode};
use crate::dictionary::{write_entries, Dictionary};
use crate::error::Result;
use crate::profile::{Report, Stopwatch};
use crate::streamer::Wordstreamer;

/// Output and instrumentation switches of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Do not write the count table.
    pub quiet: bool,
    /// Collect timings for [`MapReduce::report`].
    pub profiling: bool,
    /// Write the table in full alphabetical order instead of bucket order.
    pub sorted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Mapped,
    Reduced,
}

/// A worker's private state.
pub(crate) struct Pair {
    streamer: Wordstreamer,
    dictionary: Dictionary,
}

impl Pair {
    /// Put every word of the streamer into the dictionary.
    fn drain(&mut self) -> u64 {
        while let Some(word) = self.streamer.next_word() {
            self.dictionary.put(word);
        }
        self.streamer.words_emitted()
    }
}

pub struct MapReduce {
    path: PathBuf,
    mode: Mode,
    options: Options,
    colors: bool,
    phase: Phase,
    pairs: Vec<Pair>,
    created: Instant,
    timer_map: Stopwatch,
    timer_reduce: Stopwatch,
    timer_total: Stopwatch,
}

impl MapReduce {
    /// Open `path` and prepare `nb_workers` pairs (one in sequential mode).
    pub fn new(
        path: &Path,
        nb_workers: usize,
        mode: Mode,
        config: &Config,
        options: Options,
    ) -> Result<Self> {
        let nb_pairs = match mode {
            Mode::Parallel => nb_workers,
            Mode::Sequential => 1,
        };

        let first = Wordstreamer::create_first(
            path,
            nb_pairs,
            config.strategy,
            config,
            options.profiling,
        )?;
        let mut streamers: Vec<Wordstreamer> =
            (1..nb_pairs).map(|id| first.create_another(id)).collect();
        streamers.insert(0, first);

        let pairs = streamers
            .into_iter()
            .map(|streamer| Pair {
                streamer,
                dictionary: Dictionary::new(config, options.profiling),
            })
            .collect();

        debug!(path = %path.display(), ?mode, workers = nb_pairs, "mapreduce created");

        Ok(Self {
            path: path.to_path_buf(),
            mode,
            options,
            colors: config.colors,
            phase: Phase::Created,
            pairs,
            created: Instant::now(),
            timer_map: Stopwatch::new(options.profiling),
            timer_reduce: Stopwatch::new(options.profiling),
            timer_total: Stopwatch::new(options.profiling),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn nb_workers(&self) -> usize {
        self.pairs.len()
    }

    /// Count every word of the file into the per-worker dictionaries.
    ///
    /// # Panics
    ///
    /// Panics unless called once, right after [`MapReduce::new`].
    pub fn map(&mut self) -> Result<()> {
        assert_eq!(self.phase, Phase::Created, "map must run exactly once, before reduce");

        let started = Instant::now();
        let timer = self.timer_map.start();
        match self.mode {
            Mode::Parallel => parallel::map(&mut self.pairs)?,
            Mode::Sequential => sequential::map(&mut self.pairs),
        }
        self.timer_map.stop(timer);
        self.phase = Phase::Mapped;

        info!(elapsed = ?started.elapsed(), workers = self.pairs.len(), "map done");
        Ok(())
    }

    /// Fold all dictionaries into the first and, unless quiet, write one
    /// `word=count` line per distinct word to `out`.
    ///
    /// # Panics
    ///
    /// Panics unless [`MapReduce::map`] has completed and reduce has not run.
    pub fn reduce(&mut self, out: &mut impl Write) -> Result<()> {
        assert_eq!(self.phase, Phase::Mapped, "reduce must run once, after map");

        let started = Instant::now();
        let timer = self.timer_reduce.start();
        if let Some((first, rest)) = self.pairs.split_first_mut() {
            for pair in rest.iter() {
                first.dictionary.merge(&pair.dictionary);
            }
        }
        // Folded from here on, even if writing fails below.
        self.phase = Phase::Reduced;

        if !self.options.quiet {
            let result = self.result();
            if self.options.sorted {
                write_entries(result.sorted_entries(), out)?;
            } else {
                result.write_to(out)?;
            }
            out.flush()?;
        }
        self.timer_reduce.stop(timer);
        self.timer_total.stop(self.options.profiling.then_some(self.created));

        info!(elapsed = ?started.elapsed(), distinct = self.result().len(), "reduce done");
        Ok(())
    }

    /// The folded dictionary after [`MapReduce::reduce`]; before it, the
    /// counts of worker 0 only.
    pub fn result(&self) -> &Dictionary {
        &self.pairs[0].dictionary
    }

    /// Timings and throughput of the run. Durations are zero unless the
    /// run was built with profiling enabled.
    pub fn report(&self) -> Report {
        let mut report = Report {
            total: self.timer_total.elapsed(),
            file_size: self.pairs[0].streamer.file_size(),
            words: self.result().total(),
            ..Report::default()
        };
        report.push("[MapReduce] map", self.timer_map.elapsed());
        report.push("[MapReduce] reduce", self.timer_reduce.elapsed());
        for (id, pair) in self.pairs.iter().enumerate() {
            report.push(format!("[Wordstreamer {id}] get"), pair.streamer.get_time());
            report.push(format!("[Dictionary {id}] put"), pair.dictionary.put_time());
        }
        report
    }

    pub fn colors(&self) -> bool {
        self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReaderKind, Strategy};
    use crate::source::tests::{temp_file, LOREM};

    const EXPECTED: [(&str, u64); 8] = [
        ("adipiscing", 3),
        ("consectetur", 4),
        ("amet", 5),
        ("pharetra", 1),
        ("sit", 5),
        ("viverra", 2),
        ("lorem", 4),
        ("donec", 5),
    ];

    fn run(nb: usize, mode: Mode, config: &Config, options: Options) -> (MapReduce, String) {
        let file = temp_file(LOREM.as_bytes());
        let mut mr = MapReduce::new(file.path(), nb, mode, config, options).unwrap();
        mr.map().unwrap();
        let mut out = Vec::new();
        mr.reduce(&mut out).unwrap();
        (mr, String::from_utf8(out).unwrap())
    }

    fn check_counts(mr: &MapReduce) {
        for (word, count) in EXPECTED {
            assert_eq!(mr.result().count(word.as_bytes()), count, "{word}");
        }
    }

    #[test]
    fn test_lorem_counts_for_any_worker_count() {
        let mut reference: Option<String> = None;
        for reader in [ReaderKind::Mmap, ReaderKind::Read] {
            for strategy in [Strategy::Scattered, Strategy::Interleaved] {
                let config = Config {
                    strategy,
                    reader,
                    ..Config::default()
                };
                for nb in 1..=11 {
                    let (mr, out) = run(nb, Mode::Parallel, &config, Options::default());
                    check_counts(&mr);
                    assert_eq!(mr.phase(), Phase::Reduced);
                    match &reference {
                        Some(expected) => assert_eq!(&out, expected, "{strategy:?} {reader:?} {nb}"),
                        None => reference = Some(out),
                    }
                }
            }
        }
    }

    #[test]
    fn test_sequential_mode_uses_one_pair() {
        let (mr, out) = run(8, Mode::Sequential, &Config::default(), Options::default());
        assert_eq!(mr.nb_workers(), 1);
        assert_eq!(mr.mode(), Mode::Sequential);
        check_counts(&mr);
        assert!(out.contains("amet=5\n"));
    }

    #[test]
    fn test_quiet_writes_nothing() {
        let options = Options {
            quiet: true,
            ..Options::default()
        };
        let (mr, out) = run(3, Mode::Parallel, &Config::default(), options);
        assert!(out.is_empty());
        check_counts(&mr);
    }

    #[test]
    fn test_sorted_output() {
        let options = Options {
            sorted: true,
            ..Options::default()
        };
        let (_, out) = run(4, Mode::Parallel, &Config::default(), options);
        let words: Vec<&str> = out.lines().map(|line| line.split('=').next().unwrap()).collect();
        let mut expected = words.clone();
        expected.sort_unstable();
        assert_eq!(words, expected);
    }

    #[test]
    fn test_output_lines_match_result() {
        let (mr, out) = run(2, Mode::Parallel, &Config::default(), Options::default());
        assert_eq!(out.lines().count(), mr.result().len());
        let total: u64 = out
            .lines()
            .map(|line| line.rsplit('=').next().unwrap().parse::<u64>().unwrap())
            .sum();
        assert_eq!(total, mr.result().total());
    }

    #[test]
    fn test_profiling_report() {
        let options = Options {
            profiling: true,
            quiet: true,
            ..Options::default()
        };
        let (mr, _) = run(3, Mode::Parallel, &Config::default(), options);
        let report = mr.report();
        assert_eq!(report.file_size, LOREM.len() as u64);
        assert_eq!(report.words, mr.result().total());
        assert_eq!(report.timings.len(), 2 + 2 * 3);
        assert!(report.total > std::time::Duration::ZERO);
    }

    #[test]
    fn test_empty_file() {
        let file = temp_file(b"");
        let mut mr = MapReduce::new(file.path(), 4, Mode::Parallel, &Config::default(), Options::default()).unwrap();
        mr.map().unwrap();
        let mut out = Vec::new();
        mr.reduce(&mut out).unwrap();
        assert!(out.is_empty());
        assert!(mr.result().is_empty());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_failed_write_still_completes_reduce() {
        let file = temp_file(b"a b a b");
        let mut mr = MapReduce::new(file.path(), 2, Mode::Parallel, &Config::default(), Options::default()).unwrap();
        mr.map().unwrap();

        let err = mr.reduce(&mut BrokenPipe).unwrap_err();
        assert_eq!(err.exit_code(), 6);
        assert_eq!(mr.phase(), Phase::Reduced);
        assert_eq!(mr.result().count(b"a"), 2);
        assert_eq!(mr.result().count(b"b"), 2);
    }

    #[test]
    #[should_panic(expected = "reduce must run once, after map")]
    fn test_reduce_cannot_fold_twice() {
        let file = temp_file(b"a b a b");
        let mut mr = MapReduce::new(file.path(), 2, Mode::Parallel, &Config::default(), Options::default()).unwrap();
        mr.map().unwrap();
        let _ = mr.reduce(&mut BrokenPipe);
        let _ = mr.reduce(&mut std::io::sink());
    }

    #[test]
    #[should_panic(expected = "reduce must run once, after map")]
    fn test_reduce_before_map_panics() {
        let file = temp_file(b"word");
        let mut mr = MapReduce::new(file.path(), 1, Mode::Parallel, &Config::default(), Options::default()).unwrap();
        mr.reduce(&mut std::io::sink()).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let result = MapReduce::new(
            Path::new("/nonexistent/book.txt"),
            2,
            Mode::Parallel,
            &Config::default(),
            Options::default(),
        );
        assert!(matches!(result, Err(crate::error::MapReduceError::FileAccess { .. })));
    }
}
