//! Run these benches with `cargo bench --bench retrieval -- --verbose`
use criterion::{criterion_group, criterion_main, Criterion};
use dualpol_analysis::{doctest::FakeAlgorithms, DualPolRetrieval, RetrievalConfig};

mod utils;

criterion_main!(retrieval_benches);

criterion_group!(
    retrieval_benches,
    full_retrieval_bench,
    retrieval_with_qc_bench
);

fn full_retrieval_bench(c: &mut Criterion) {
    let vol = utils::load_test_volume();
    let config = RetrievalConfig::new()
        .with_differential_phase("DP")
        .with_sounding(utils::sample_sounding());
    let algs = FakeAlgorithms::default();

    c.bench_function("full_retrieval", |b| {
        b.iter(|| {
            let mut vol = vol.clone();
            let _x = DualPolRetrieval::new(&mut vol, config.clone(), &algs).expect("oops");
        });
    });
}

fn retrieval_with_qc_bench(c: &mut Criterion) {
    let vol = utils::load_test_volume();
    let config = RetrievalConfig::new()
        .with_differential_phase("DP")
        .with_qc(true);
    let algs = FakeAlgorithms::default();

    c.bench_function("retrieval_with_qc", |b| {
        b.iter(|| {
            let mut vol = vol.clone();
            let _x = DualPolRetrieval::new(&mut vol, config.clone(), &algs).expect("oops");
        });
    });
}
