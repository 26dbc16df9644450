// Word count throughput per partition strategy, backend and thread count.

use std::io::{self, Write};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mapreduce::{Config, MapReduce, Mode, Options, ReaderKind, Strategy};
use tempfile::NamedTempFile;

const WORDS: [&str; 12] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "donec",
    "viverra", "pharetra", "Maecenas",
];

fn corpus(bytes: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let mut written = 0;
    let mut i = 0usize;
    while written < bytes {
        let word = WORDS[(i * 7 + i / 3) % WORDS.len()];
        let sep = if i % 11 == 10 { ".\n" } else { " " };
        write!(file, "{word}{sep}").unwrap();
        written += word.len() + sep.len();
        i += 1;
    }
    file.flush().unwrap();
    file
}

fn count(file: &NamedTempFile, threads: usize, config: &Config) -> u64 {
    let options = Options {
        quiet: true,
        ..Options::default()
    };
    let mut mr = MapReduce::new(file.path(), threads, Mode::Parallel, config, options).unwrap();
    mr.map().unwrap();
    mr.reduce(&mut io::sink()).unwrap();
    mr.result().total()
}

fn strategies_benchmark(c: &mut Criterion) {
    let file = corpus(4 * 1024 * 1024);
    let size = file.as_file().metadata().unwrap().len();

    let mut group = c.benchmark_group("word_count");
    group.throughput(Throughput::Bytes(size));
    group.sample_size(10);

    for strategy in [Strategy::Scattered, Strategy::Interleaved] {
        for reader in [ReaderKind::Mmap, ReaderKind::Read] {
            let config = Config {
                strategy,
                reader,
                ..Config::default()
            };
            for threads in [1, 2, 4, 8] {
                let id = BenchmarkId::new(format!("{strategy:?}/{reader:?}"), threads);
                group.bench_with_input(id, &threads, |b, &threads| {
                    b.iter(|| count(black_box(&file), threads, &config))
                });
            }
        }
    }

    group.finish();
}

fn arena_benchmark(c: &mut Criterion) {
    let file = corpus(1024 * 1024);

    let mut group = c.benchmark_group("word_storage");
    group.sample_size(10);
    for use_arena in [true, false] {
        let config = Config {
            use_arena,
            ..Config::default()
        };
        let name = if use_arena { "arena" } else { "heap" };
        group.bench_function(name, |b| b.iter(|| count(black_box(&file), 4, &config)));
    }
    group.finish();
}

criterion_group!(benches, strategies_benchmark, arena_benchmark);
criterion_main!(benches);
