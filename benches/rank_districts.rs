//! Benchmarks for a full scoring run over synthetic feed snapshots.
//!
//! Compares the sequential and Rayon coordinators as the number of districts
//! grows. Every district carries weather, vegetation and a price row per crop.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use planting_advisor::{
    CropScorer, FeedSnapshot, PriceObservation, ScoringConfig, VegetationObservation,
    WeatherObservation,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(6, 0, 0))
        .unwrap()
}

/// Two readings per key so latest-wins has work to do
fn synthetic_snapshot(districts: usize, crops: &[String], seed: u64) -> FeedSnapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut snapshot = FeedSnapshot::default();

    for d in 0..districts {
        let district = format!("District {:04}", d);
        for hour in 0..2 {
            let timestamp = base_time() + Duration::hours(hour);
            snapshot.weather.push(WeatherObservation {
                district: district.clone(),
                timestamp,
                temperature: Some(rng.gen_range(10.0..36.0)),
                humidity: Some(rng.gen_range(30.0..95.0)),
                rainfall: Some(rng.gen_range(0.0..12.0)),
                condition: None,
            });
            snapshot.vegetation.push(VegetationObservation {
                district: district.clone(),
                timestamp,
                ndvi_value: Some(rng.gen_range(0.0..0.9)),
                ndvi_prior: Some(rng.gen_range(0.0..0.9)),
                soil_moisture_pct: Some(rng.gen_range(5.0..60.0)),
            });
            for crop in crops {
                snapshot.prices.push(PriceObservation {
                    district: district.clone(),
                    crop: crop.clone(),
                    timestamp,
                    price_current: Some(rng.gen_range(300.0..5000.0)),
                    price_prior: Some(rng.gen_range(300.0..5000.0)),
                });
            }
        }
    }

    snapshot
}

fn bench_scoring_run(c: &mut Criterion) {
    let mut config = ScoringConfig::default();
    config.districts.clear();
    let crops: Vec<String> = config.crops.iter().map(|c| c.name.clone()).collect();
    let scorer = CropScorer::new(config).unwrap();

    let mut group = c.benchmark_group("scoring_run");
    for &districts in &[4usize, 64, 512] {
        let snapshot = synthetic_snapshot(districts, &crops, 42);
        group.throughput(Throughput::Elements((districts * crops.len()) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", districts), &snapshot, |b, s| {
            b.iter(|| scorer.score_snapshot(black_box(s)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", districts), &snapshot, |b, s| {
            b.iter(|| scorer.score_snapshot_parallel(black_box(s)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scoring_run);
criterion_main!(benches);
