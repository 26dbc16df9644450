//! Defaults and runtime configuration.
//!
//! Compile-time defaults are plain constants. The [`Config`] value can be
//! loaded from a TOML file and is threaded explicitly through every
//! constructor that needs it, so nothing in the crate reads global toggles.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::MapReduceError;

// =============================================================================
// Constants
// =============================================================================

pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 64;

/// Bytes reserved by every arena chunk.
pub const ARENA_CHUNK_SIZE: usize = 1024;

/// Buffer size used by the `read`-based byte source.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Number of distinct values a hashed byte can take.
pub const HASH_CHAR_SIZE: usize = 256;

/// Leading bytes of a word that feed the bucket hash.
pub const HASH_CHARS_USED: usize = 2;

/// One bucket per ordered pair of leading bytes.
pub const HASH_SIZE: usize = HASH_CHAR_SIZE * HASH_CHAR_SIZE;

// =============================================================================
// Selectors
// =============================================================================

/// How a file is split between cooperating partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Contiguous, non-overlapping byte ranges.
    #[default]
    Scattered,
    /// Round-robin ownership of consecutive words.
    Interleaved,
}

/// Which byte-source backend reads the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    /// Shared read-only memory mapping.
    #[default]
    Mmap,
    /// Positional reads into a private buffer.
    Read,
}

/// Execution mode of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Parallel,
    Sequential,
}

// =============================================================================
// Runtime configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub mode: Mode,
    pub strategy: Strategy,
    pub reader: ReaderKind,
    pub read_buffer_size: usize,
    pub use_arena: bool,
    pub arena_chunk_size: usize,
    pub colors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            strategy: Strategy::default(),
            reader: ReaderKind::default(),
            read_buffer_size: READ_BUFFER_SIZE,
            use_arena: true,
            arena_chunk_size: ARENA_CHUNK_SIZE,
            colors: true,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, MapReduceError> {
        let content = fs::read_to_string(path)
            .map_err(|err| MapReduceError::config(path, format!("cannot read file: {err}")))?;
        let config =
            Self::from_toml(&content).map_err(|err| MapReduceError::config(path, err.to_string()))?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn validate(&self, origin: &Path) -> Result<(), MapReduceError> {
        if self.read_buffer_size == 0 {
            return Err(MapReduceError::config(origin, "read_buffer_size must be positive"));
        }
        if self.arena_chunk_size == 0 {
            return Err(MapReduceError::config(origin, "arena_chunk_size must be positive"));
        }
        Ok(())
    }
}
