use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can go wrong before or around a count run.
///
/// Violations of internal preconditions are not listed here: they panic.
#[derive(Error, Debug)]
pub enum MapReduceError {
    #[error("You should start the program with more threads ({requested} < {min})")]
    TooFewThreads { requested: usize, min: usize },

    #[error("You should start the program with fewer threads ({requested} > {max})")]
    TooManyThreads { requested: usize, max: usize },

    #[error("File '{}' does not exist or cannot be accessed in read mode: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Cannot start worker thread: {0}")]
    ThreadSpawn(#[source] io::Error),

    #[error("Cannot write results: {0}")]
    Io(#[from] io::Error),
}

impl MapReduceError {
    pub fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub fn config(path: &Path, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Process exit status, distinct per error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TooFewThreads { .. } => 1,
            Self::TooManyThreads { .. } => 2,
            Self::FileAccess { .. } => 3,
            Self::Config { .. } => 4,
            Self::ThreadSpawn(_) => 5,
            Self::Io(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapReduceError>;
