//! Profiling stopwatches and the throughput report.
//!
//! A [`Stopwatch`] built disabled never reads the clock, so components can
//! carry one unconditionally.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use colored::Colorize;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Accumulates elapsed time over any number of start/stop pairs.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    enabled: bool,
    elapsed: Duration,
}

impl Stopwatch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn start(&self) -> Option<Instant> {
        self.enabled.then(Instant::now)
    }

    #[inline]
    pub fn stop(&mut self, started: Option<Instant>) {
        if let Some(started) = started {
            self.elapsed += started.elapsed();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Timings collected over one run, printed after `reduce`.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// `(label, elapsed)` in display order.
    pub timings: Vec<(String, Duration)>,
    pub total: Duration,
    pub file_size: u64,
    pub words: u64,
}

impl Report {
    pub fn push(&mut self, label: impl Into<String>, elapsed: Duration) {
        self.timings.push((label.into(), elapsed));
    }

    pub fn megabytes(&self) -> f64 {
        self.file_size as f64 / BYTES_PER_MB
    }

    /// `None` when the run was too short to measure.
    pub fn megabytes_per_sec(&self) -> Option<f64> {
        let secs = self.total.as_secs_f64();
        (secs > 1e-6).then(|| self.megabytes() / secs)
    }

    pub fn mwords_per_sec(&self) -> Option<f64> {
        let secs = self.total.as_secs_f64();
        (secs > 1e-6).then(|| self.words as f64 / 1e6 / secs)
    }

    pub fn write_to(&self, out: &mut impl Write, colors: bool) -> io::Result<()> {
        let mut lines: Vec<(String, String)> = self
            .timings
            .iter()
            .map(|(label, elapsed)| (format!(" |-{label}:"), format!("{:.3} ms", millis(*elapsed))))
            .collect();
        lines.push((" |---> TOTAL:".to_string(), format!("{:.3} ms", millis(self.total))));

        for (label, value) in &lines {
            if colors {
                writeln!(out, "{} {}", label.blue(), value.blue().bold())?;
            } else {
                writeln!(out, "{label} {value}")?;
            }
        }

        if let (Some(mbps), Some(mwps)) = (self.megabytes_per_sec(), self.mwords_per_sec()) {
            let size = format!(" |---> [File Size: {:.2} MB]  ->", self.megabytes());
            let words = format!(" |---> [Words: {}]  ->", self.words);
            let mbps = format!("{mbps:.3} MB/s");
            let mwps = format!("{mwps:.3} MWords/s");
            if colors {
                writeln!(out, "{} {}", size.yellow(), mbps.yellow().bold())?;
                writeln!(out, "{} {}", words.yellow(), mwps.yellow().bold())?;
            } else {
                writeln!(out, "{size} {mbps}")?;
                writeln!(out, "{words} {mwps}")?;
            }
        }
        Ok(())
    }
}
