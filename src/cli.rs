//! Command-line surface and argument validation.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{Config, Mode, ReaderKind, Strategy, MAX_THREADS, MIN_THREADS};
use crate::error::{MapReduceError, Result};
use crate::mapreduce::Options;

#[derive(Parser, Debug)]
#[command(
    name = "mapreduce",
    version,
    about = "Count the occurrences of every word in a file with N threads"
)]
pub struct Cli {
    /// File to read
    pub file: PathBuf,

    /// Number of worker threads
    pub num_threads: usize,

    /// Run the map phase in parallel or on a single thread
    #[arg(long, short = 't', value_enum)]
    pub mode: Option<Mode>,

    /// How the file is split between workers
    #[arg(long, short = 'w', value_enum)]
    pub strategy: Option<Strategy>,

    /// Byte source backend
    #[arg(long, short = 'r', value_enum)]
    pub reader: Option<ReaderKind>,

    /// Buffer size of the `read` backend
    #[arg(long, value_name = "BYTES")]
    pub read_buffer: Option<usize>,

    /// Store words on the heap instead of in arena chunks
    #[arg(long)]
    pub no_arena: bool,

    /// Print the table in alphabetical order
    #[arg(long)]
    pub sorted: bool,

    /// Do not output results
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print timings and throughput after the results
    #[arg(long, short = 'p')]
    pub profiling: bool,

    /// Log progress to stderr
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long)]
    pub no_color: bool,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// A validated invocation.
#[derive(Debug, Clone)]
pub struct Job {
    pub file: PathBuf,
    pub num_threads: usize,
    pub config: Config,
    pub options: Options,
}

impl Cli {
    /// Merge the config file with the flags and check thread count and file
    /// access. Nothing is counted before this succeeds.
    pub fn validate(self) -> Result<Job> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(reader) = self.reader {
            config.reader = reader;
        }
        if let Some(size) = self.read_buffer {
            config.read_buffer_size = size;
        }
        if self.no_arena {
            config.use_arena = false;
        }
        if self.no_color {
            config.colors = false;
        }
        config.validate(self.config.as_deref().unwrap_or(Path::new("<command line>")))?;

        check_threads(self.num_threads)?;
        check_readable(&self.file)?;

        Ok(Job {
            file: self.file,
            num_threads: self.num_threads,
            config,
            options: Options {
                quiet: self.quiet,
                profiling: self.profiling,
                sorted: self.sorted,
            },
        })
    }
}

impl Job {
    /// Colors are on unless the config file, `--no-color` or `NO_COLOR`
    /// turned them off.
    pub fn colors_enabled(&self, no_color_env: bool) -> bool {
        self.config.colors && !no_color_env
    }

    /// Whether a parallel map would run more workers than `cpus`.
    pub fn oversubscribes(&self, cpus: usize) -> bool {
        self.config.mode == Mode::Parallel && self.num_threads > cpus
    }
}

fn check_threads(requested: usize) -> Result<()> {
    if requested < MIN_THREADS {
        return Err(MapReduceError::TooFewThreads {
            requested,
            min: MIN_THREADS,
        });
    }
    if requested > MAX_THREADS {
        return Err(MapReduceError::TooManyThreads {
            requested,
            max: MAX_THREADS,
        });
    }
    Ok(())
}

fn check_readable(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|err| MapReduceError::file_access(path, err))?;
    let metadata = file
        .metadata()
        .map_err(|err| MapReduceError::file_access(path, err))?;
    if metadata.is_dir() {
        return Err(MapReduceError::file_access(
            path,
            io::Error::other("is a directory"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::temp_file;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mapreduce").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let file = temp_file(b"words");
        let path = file.path().to_str().unwrap();
        let job = parse(&[path, "4"]).validate().unwrap();
        assert_eq!(job.num_threads, 4);
        assert_eq!(job.config, Config::default());
        assert_eq!(job.options, Options::default());
    }

    #[test]
    fn test_thread_range() {
        let file = temp_file(b"words");
        let path = file.path().to_str().unwrap();

        let err = parse(&[path, "0"]).validate().unwrap_err();
        assert!(matches!(err, MapReduceError::TooFewThreads { requested: 0, .. }));
        assert_eq!(err.exit_code(), 1);

        let err = parse(&[path, "65"]).validate().unwrap_err();
        assert!(matches!(err, MapReduceError::TooManyThreads { requested: 65, .. }));
        assert_eq!(err.exit_code(), 2);

        assert!(parse(&[path, "64"]).validate().is_ok());
        assert!(parse(&[path, "1"]).validate().is_ok());
    }

    #[test]
    fn test_file_access() {
        let err = parse(&["/nonexistent/book.txt", "2"]).validate().unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let dir = tempfile::tempdir().unwrap();
        let err = parse(&[dir.path().to_str().unwrap(), "2"]).validate().unwrap_err();
        assert!(matches!(err, MapReduceError::FileAccess { .. }));
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = temp_file(b"words");
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("mapreduce.toml");
        std::fs::write(&config_path, "strategy = \"interleaved\"\nreader = \"read\"\nread_buffer_size = 64\n").unwrap();

        let job = parse(&[
            file.path().to_str().unwrap(),
            "3",
            "--config",
            config_path.to_str().unwrap(),
            "--reader",
            "mmap",
            "--no-arena",
            "-t",
            "sequential",
            "-q",
            "-p",
            "--sorted",
            "--no-color",
        ])
        .validate()
        .unwrap();

        assert_eq!(job.config.strategy, Strategy::Interleaved);
        assert_eq!(job.config.reader, ReaderKind::Mmap);
        assert_eq!(job.config.read_buffer_size, 64);
        assert_eq!(job.config.mode, Mode::Sequential);
        assert!(!job.config.use_arena);
        assert!(!job.config.colors);
        assert!(job.options.quiet && job.options.profiling && job.options.sorted);
    }

    #[test]
    fn test_config_file_disables_colors() {
        let file = temp_file(b"words");
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("mapreduce.toml");
        std::fs::write(&config_path, "colors = false\n").unwrap();

        let job = parse(&[file.path().to_str().unwrap(), "2", "--config", config_path.to_str().unwrap()])
            .validate()
            .unwrap();
        assert!(!job.config.colors);
        assert!(!job.colors_enabled(false));

        let job = parse(&[file.path().to_str().unwrap(), "2"]).validate().unwrap();
        assert!(job.colors_enabled(false));
        assert!(!job.colors_enabled(true));
    }

    #[test]
    fn test_oversubscription() {
        let file = temp_file(b"words");
        let path = file.path().to_str().unwrap();

        let job = parse(&[path, "8"]).validate().unwrap();
        assert!(job.oversubscribes(4));
        assert!(!job.oversubscribes(8));

        let job = parse(&[path, "8", "-t", "sequential"]).validate().unwrap();
        assert!(!job.oversubscribes(4));
    }

    #[test]
    fn test_zero_read_buffer_rejected() {
        let file = temp_file(b"words");
        let err = parse(&[file.path().to_str().unwrap(), "2", "--read-buffer", "0"])
            .validate()
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["mapreduce", "book.txt"]).is_err());
        assert!(Cli::try_parse_from(["mapreduce", "book.txt", "two"]).is_err());
        assert!(Cli::try_parse_from(["mapreduce", "book.txt", "2", "-w", "diagonal"]).is_err());
        assert!(Cli::try_parse_from(["mapreduce", "book.txt", "2", "-q", "-v"]).is_err());
    }
}
