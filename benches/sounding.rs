//! Run these benches with `cargo bench --bench sounding -- --verbose`
use criterion::{criterion_group, criterion_main, Criterion};
use dualpol_analysis::{gate_heights, temperature::interpolate_temperature, SoundingProfile};

mod utils;

criterion_main!(sounding_benches);

criterion_group!(sounding_benches, load_sounding_bench, gate_temperature_bench);

fn load_sounding_bench(c: &mut Criterion) {
    let src = utils::sample_sounding();

    c.bench_function("load_sounding", |b| {
        b.iter(|| {
            let _x = SoundingProfile::from_source(&src).expect("oops");
        });
    });
}

fn gate_temperature_bench(c: &mut Criterion) {
    let snd = SoundingProfile::from_source(&utils::sample_sounding()).expect("oops");
    let vol = utils::load_test_volume();

    c.bench_function("gate_heights", |b| {
        b.iter(|| {
            let _x = gate_heights(vol.geometry());
        });
    });

    let heights = gate_heights(vol.geometry());
    c.bench_function("interpolate_temperature", |b| {
        b.iter(|| {
            let _x = interpolate_temperature(&snd, &heights).expect("oops");
        });
    });
}
