use std::hint::black_box;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nightplan::astro::{calculate_altaz, moon_position, sun_altitude, MoonPrecision};
use nightplan::models::{CelestialObject, ObjectId, Observer};
use nightplan::services::VisibilityWindowFinder;
use nightplan::{NightPlanner, PlanRequest, PlannerConfig};

fn la_palma() -> PlannerConfig {
    PlannerConfig::new(28.7624, -17.8892)
}

fn bench_ephemerides(c: &mut Criterion) {
    let mut group = c.benchmark_group("ephemerides");
    let observer = Observer::from_degrees(28.7624, -17.8892).unwrap();
    let t = Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap();

    group.bench_function("altaz", |b| {
        b.iter(|| calculate_altaz(black_box(&observer), black_box(1.46), black_box(0.38), black_box(t)))
    });
    group.bench_function("sun_altitude", |b| {
        b.iter(|| sun_altitude(black_box(&observer), black_box(t)))
    });
    for precision in [MoonPrecision::Standard, MoonPrecision::High] {
        group.bench_with_input(
            BenchmarkId::new("moon_position", format!("{:?}", precision)),
            &precision,
            |b, p| b.iter(|| moon_position(black_box(&observer), black_box(t), *p)),
        );
    }

    group.finish();
}

fn bench_visibility_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("visibility_window");
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 18, 30, 0).unwrap();
    let finder = VisibilityWindowFinder::from_config(&la_palma()).unwrap();

    for hours in [2i64, 6, 12] {
        group.bench_with_input(BenchmarkId::new("m42", hours), &hours, |b, h| {
            b.iter(|| finder.find_window(1.4633, -0.0946, start, start + Duration::hours(*h), false))
        });
    }

    group.finish();
}

fn bench_full_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("night_plan");
    group.sample_size(10);

    let catalog: Vec<CelestialObject> = (0..40)
        .map(|i| {
            CelestialObject::new(
                ObjectId::new(i),
                format!("Obj{}", i),
                (i as f64 * 0.6) % 24.0,
                -20.0 + (i as f64 * 7.0) % 80.0,
                Some("20'x15'".to_string()),
                Some(6.0 + (i % 6) as f64),
            )
        })
        .collect();
    let planner = NightPlanner::new(la_palma()).unwrap();
    let request = PlanRequest::for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

    group.bench_function("forty_objects", |b| {
        b.iter(|| planner.plan(black_box(&catalog), black_box(&request)))
    });

    group.finish();
}

criterion_group!(benches, bench_ephemerides, bench_visibility_window, bench_full_plan);
criterion_main!(benches);
