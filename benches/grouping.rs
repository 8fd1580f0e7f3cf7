use colorforge::{group_colors, Algorithm, GroupingConfig, Metric};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn palette(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            format!(
                "#{:02x}{:02x}{:02x}",
                (i * 37) % 256,
                (i * 91 + 40) % 256,
                (i * 53 + 7) % 256
            )
        })
        .collect()
}

fn benchmark_grouping(c: &mut Criterion) {
    let tokens = palette(200);

    for metric in [Metric::EuclideanRgb, Metric::Ciede2000] {
        let config = GroupingConfig::new(Algorithm::KMeansPlusPlus)
            .with_metric(metric)
            .with_group_count(10)
            .with_random_seed(42);
        c.bench_function(&format!("kmeans++_{}", metric), |b| {
            b.iter(|| group_colors(black_box(&tokens), &config))
        });
    }

    let config = GroupingConfig::new(Algorithm::Hierarchical).with_group_count(10);
    c.bench_function("hierarchical_euclidean-rgb", |b| {
        b.iter(|| group_colors(black_box(&tokens), &config))
    });

    let config = GroupingConfig::new(Algorithm::ReadabilityProximity).with_proximity(1.5);
    c.bench_function("readability_proximity", |b| {
        b.iter(|| group_colors(black_box(&tokens), &config))
    });
}

criterion_group!(benches, benchmark_grouping);
criterion_main!(benches);
