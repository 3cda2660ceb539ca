use criterion::*;
use oiwvf::{
    match_sampling, units::LengthUnits, Builder, FromBuilder, Optics, SpectralImage,
    WavefrontSpec,
};

fn image(n: usize) -> SpectralImage {
    SpectralImage::from_fn(
        n,
        n,
        (0..7).map(|k| (400. + 50. * k as f64).nm()).collect(),
        2f64.um(),
        |i, j, _| ((i * 7 + j * 13) % 17) as f64,
    )
    .unwrap()
}

pub fn psf(c: &mut Criterion) {
    let spec = WavefrontSpec::builder()
        .wavelengths(vec![450f64.nm(), 550f64.nm(), 650f64.nm()])
        .build()
        .unwrap();
    let mut group = c.benchmark_group("psf");
    for n in [128, 256] {
        let matched = match_sampling(&spec, 0.5f64.um(), n, 550f64.nm()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &matched, |b, spec| {
            b.iter(|| spec.compute_psf(None).unwrap())
        });
    }
    group.finish();
}

pub fn optics(c: &mut Criterion) {
    let optics = Optics::builder().build().unwrap();
    let mut group = c.benchmark_group("optics");
    group.sample_size(10);
    for n in [64, 128] {
        let image = image(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &image, |b, image| {
            b.iter_batched(
                || image.clone(),
                |mut image| optics.compute(&mut image).unwrap(),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, psf, optics);
criterion_main!(benches);
