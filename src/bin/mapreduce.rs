use std::io::{self, BufWriter, Write};
use std::process;

use clap::Parser;
use colored::Colorize;
use tracing::warn;

use mapreduce::cli::{Cli, Job};
use mapreduce::{MapReduce, Result};

fn init_tracing(quiet: bool, verbose: bool, ansi: bool) {
    // --quiet  → "off"
    // --verbose → RUST_LOG if set, else "info"
    // default  → "off", so the count table on stdout stays clean
    let filter = if quiet || !verbose {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let (quiet, verbose, no_color) = (cli.quiet, cli.verbose, cli.no_color);
    let no_color_env = std::env::var_os("NO_COLOR").is_some();

    // The config file may turn colors off, so it is merged first.
    let job = cli.validate();
    let colors = match &job {
        Ok(job) => job.colors_enabled(no_color_env),
        Err(_) => !(no_color || no_color_env),
    };
    if !colors {
        colored::control::set_override(false);
    }

    init_tracing(quiet, verbose, colors);

    if let Err(err) = job.and_then(run) {
        eprintln!("{} {err}", "error:".red().bold());
        process::exit(err.exit_code());
    }
}

fn run(job: Job) -> Result<()> {
    let cpus = num_cpus::get();
    if job.oversubscribes(cpus) {
        warn!(threads = job.num_threads, cpus, "more worker threads than logical CPUs");
    }

    let mut mr = MapReduce::new(
        &job.file,
        job.num_threads,
        job.config.mode,
        &job.config,
        job.options,
    )?;
    mr.map()?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    mr.reduce(&mut out)?;

    if job.options.profiling {
        mr.report().write_to(&mut out, mr.colors())?;
    }
    out.flush()?;
    Ok(())
}
