use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use termquery::opt::Options;
use termquery::parse::{match_guard, parse_color};
use termquery::sim::SimulatedTerminal;
use termquery::Session;

const REPLY: &[u8] = b"\x1b]4;123;rgb:b06b/f4af/38f3\x07\x1b[24;80R";

pub fn run_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply");
    group.bench_function("match-and-parse", |b| {
        b.iter(|| {
            let guard = match_guard(REPLY).expect("reply has guard");
            parse_color(&REPLY[..guard.prefix])
        })
    });
    group.finish();

    // Compare probing with querying all colors one by one.
    let mut group = c.benchmark_group("palette");
    for size in [16, 256] {
        group.bench_function(format!("probe-{}", size), |b| {
            b.iter_batched(
                || {
                    let terminal = SimulatedTerminal::new().with_palette_size(size);
                    Session::open(terminal, Options::default()).expect("simulated terminal")
                },
                |mut session| session.probe_color_count(100),
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("enumerate-{}", size), |b| {
            b.iter_batched(
                || {
                    let terminal = SimulatedTerminal::new()
                        .with_palette_size(size)
                        .with_chunks(vec![7, 11, 13]);
                    Session::open(terminal, Options::default()).expect("simulated terminal")
                },
                |mut session| session.query_indexed_colors(None, 100),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
