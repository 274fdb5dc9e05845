// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Imprint benchmarks

#[path = "../tests/common/mod.rs"]
mod common;

use common::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyframe_imprint::{imprint, ImprintOptions, OutputMode};

fn bench_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere");
    let patch = imprint_patch();

    for resolution in [16, 32, 64] {
        let target = SpherePatch {
            theta_resolution: resolution,
            phi_resolution: resolution,
            start_theta: 0.0,
            end_theta: 90.0,
            ..SpherePatch::default()
        }
        .to_mesh();
        group.bench_with_input(BenchmarkId::new("projected", resolution), &target, |b, target| {
            b.iter(|| imprint(black_box(target), black_box(&patch), TOLERANCE, &ImprintOptions::default()).unwrap());
        });
    }

    let target = target_sphere();
    let merged = ImprintOptions::default().with_output_mode(OutputMode::MergedImprint);
    group.bench_function("merged", |b| {
        b.iter(|| imprint(black_box(&target), black_box(&patch), TOLERANCE, &merged).unwrap());
    });

    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");

    for n in [8, 32] {
        let target = flat_grid(n);
        let extent = n as f64;
        let patch = polygon(&[
            [0.13 * extent, 0.21 * extent, 0.0],
            [0.87 * extent, 0.17 * extent, 0.0],
            [0.79 * extent, 0.83 * extent, 0.0],
            [0.19 * extent, 0.77 * extent, 0.0],
        ]);
        group.bench_with_input(BenchmarkId::new("quad_patch", n), &target, |b, target| {
            b.iter(|| imprint(black_box(target), black_box(&patch), 0.01, &ImprintOptions::default()).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sphere, bench_grid);
criterion_main!(benches);
