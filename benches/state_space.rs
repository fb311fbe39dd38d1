use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use pneu::analysis::{Analysis, AnalysisConfig};
use pneu::exec::Execution;
use pneu::net::{generate, Net};

fn bench_serial_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("serial_execution");
    for n in [8usize, 16, 32, 64] {
        let (places, transitions, arcs) = generate::serial(n);
        let net = Net::new(places, transitions, arcs).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut exec = Execution::new(&net);
                exec.run(n + 1)
            });
        });
    }
    group.finish();
}

fn bench_serial_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("serial_analysis");
    for n in [8usize, 16, 32] {
        let (places, transitions, arcs) = generate::serial(n);
        let net = Net::new(places, transitions, arcs).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut analysis = Analysis::new(Execution::new(&net));
                analysis.run(&AnalysisConfig::default())
            });
        });
    }
    group.finish();
}

fn bench_fork_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("fork_analysis");
    for depth in [2usize, 4, 6] {
        let (places, transitions, arcs) = generate::fork(depth);
        let net = Net::new(places, transitions, arcs).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let mut analysis = Analysis::new(Execution::new(&net));
                analysis.run(&AnalysisConfig::default())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_serial_execution,
    bench_serial_analysis,
    bench_fork_analysis
);
criterion_main!(benches);
