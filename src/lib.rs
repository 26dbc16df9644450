//! Parallel word count.
//!
//! A file is split into partitions ([`streamer`]), every partition is drained
//! into a private [`dictionary::Dictionary`] by its own thread, and the
//! dictionaries are folded into one ([`mapreduce`]).

pub mod arena;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod mapreduce;
pub mod profile;
pub mod source;
pub mod streamer;

pub use config::{Config, Mode, ReaderKind, Strategy};
pub use dictionary::Dictionary;
pub use error::{MapReduceError, Result};
pub use mapreduce::{MapReduce, Options, Phase};
pub use streamer::Wordstreamer;
