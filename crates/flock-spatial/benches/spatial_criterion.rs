//! Spatial index benchmarks using criterion for historical comparison.
//!
//! Each frame of a flocking step is one rebuild plus one neighbourhood query
//! per boid, so both are measured per strategy and flock size.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flock_spatial::{
    Entity, GridConfig, LinearScan, Point, QuadTree, SpatialIndex, UniformGrid, par_neighbourhoods,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const WORLD_SIZE: f32 = 5000.0;
const PERCEPTION_RADIUS: f32 = 50.0;

fn flock(count: u64) -> Vec<Entity<u32>> {
    let mut rng = StdRng::seed_from_u64(count);
    let half = WORLD_SIZE / 2.0;
    (0..count as u32)
        .map(|id| {
            Entity::new(
                id,
                Point::new(rng.gen_range(-half..half), rng.gen_range(-half..half)),
            )
        })
        .collect()
}

fn grid() -> UniformGrid<u32> {
    UniformGrid::with_config(GridConfig::for_radius(PERCEPTION_RADIUS, 1.0)).unwrap()
}

fn rebuild_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for count in [100, 1000, 10000] {
        let boids = flock(count);
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("grid", count), &boids, |b, boids| {
            let mut index = grid();
            b.iter(|| black_box(index.update(boids)));
        });

        group.bench_with_input(BenchmarkId::new("quadtree", count), &boids, |b, boids| {
            let mut index = QuadTree::default();
            b.iter(|| black_box(index.update(boids)));
        });
    }

    group.finish();
}

fn query_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbourhoods");

    for count in [100, 1000, 10000] {
        let boids = flock(count);
        group.throughput(Throughput::Elements(count));

        let mut uniform = grid();
        uniform.update(&boids);
        group.bench_with_input(BenchmarkId::new("grid", count), &boids, |b, boids| {
            let mut buffer = Vec::new();
            b.iter(|| {
                for boid in boids {
                    uniform
                        .find_nearby_into(boid.position, PERCEPTION_RADIUS, &mut buffer)
                        .unwrap();
                    black_box(buffer.len());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("grid_parallel", count), &boids, |b, boids| {
            b.iter(|| black_box(par_neighbourhoods(&uniform, boids, PERCEPTION_RADIUS).unwrap()));
        });

        let mut tree = QuadTree::default();
        tree.update(&boids);
        group.bench_with_input(BenchmarkId::new("quadtree", count), &boids, |b, boids| {
            let mut buffer = Vec::new();
            b.iter(|| {
                for boid in boids {
                    tree.find_nearby_into(boid.position, PERCEPTION_RADIUS, &mut buffer)
                        .unwrap();
                    black_box(buffer.len());
                }
            });
        });

        // Quadratic; only worth running on small flocks
        if count <= 1000 {
            let mut linear = LinearScan::new();
            linear.update(&boids);
            group.bench_with_input(BenchmarkId::new("linear", count), &boids, |b, boids| {
                let mut buffer = Vec::new();
                b.iter(|| {
                    for boid in boids {
                        linear
                            .find_nearby_into(boid.position, PERCEPTION_RADIUS, &mut buffer)
                            .unwrap();
                        black_box(buffer.len());
                    }
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, rebuild_benchmarks, query_benchmarks);
criterion_main!(benches);
