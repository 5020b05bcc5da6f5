// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bosk_geom::{Coordinate, Envelope, EuclideanDistance};
use bosk_index::{HilbertRTree, KdTree, QuadTree, RStarTree, RTree};
use bosk_metric::MTree;
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_grid_points(n: usize, cell: f64) -> Vec<Coordinate> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push(Coordinate::new(x as f64 * cell, y as f64 * cell));
        }
    }
    out
}

fn gen_random_points(count: usize, max_w: f64, max_h: f64) -> Vec<Coordinate> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        out.push(Coordinate::new(
            rng.next_f64() * max_w,
            rng.next_f64() * max_h,
        ));
    }
    out
}

fn query_window() -> Envelope {
    Envelope::new_2d(100.0, 100.0, 500.0, 500.0)
}

fn bench_rtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_quadratic");
    for &n in &[32usize, 64] {
        let points = gen_grid_points(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_query_n{}", n), |b| {
            b.iter_batched(
                || RTree::new(4, 16).unwrap(),
                |mut tree| {
                    tree.insert_all(points.iter().copied()).unwrap();
                    let hits: usize = tree.search(&query_window()).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_rstar(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_rstar");
    for &n in &[32usize, 64] {
        let points = gen_grid_points(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("insert_query_n{}", n), |b| {
            b.iter_batched(
                || RStarTree::new(4, 16).unwrap(),
                |mut tree| {
                    tree.insert_all(points.iter().copied()).unwrap();
                    let hits: usize = tree.search(&query_window()).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    let points = gen_random_points(4096, 2000.0, 2000.0);
    group.bench_function("insert_query_random", |b| {
        b.iter_batched(
            || RStarTree::new(4, 16).unwrap(),
            |mut tree| {
                tree.insert_all(points.iter().copied()).unwrap();
                let hits: usize = tree
                    .search(&Envelope::new_2d(800.0, 800.0, 1200.0, 1200.0))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_hilbert(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_hilbert");
    let world = Envelope::new_2d(0.0, 0.0, 2000.0, 2000.0);
    let points = gen_random_points(4096, 2000.0, 2000.0);
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("insert_query_random", |b| {
        b.iter_batched(
            || HilbertRTree::new(4, 16, &world).unwrap(),
            |mut tree| {
                tree.insert_all(points.iter().copied()).unwrap();
                let hits: usize = tree
                    .search(&Envelope::new_2d(800.0, 800.0, 1200.0, 1200.0))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_quadtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");
    let bounds = Envelope::new_2d(0.0, 0.0, 2000.0, 2000.0);
    let points = gen_random_points(4096, 2000.0, 2000.0);
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("insert_query_random", |b| {
        b.iter_batched(
            || QuadTree::new(&bounds).unwrap(),
            |mut tree| {
                tree.insert_all(points.iter().copied()).unwrap();
                let hits: usize = tree
                    .search(&Envelope::new_2d(800.0, 800.0, 1200.0, 1200.0))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_kdtree_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree");
    let points = gen_random_points(4096, 2000.0, 2000.0);
    group.bench_function("build_then_many_nearest", |b| {
        b.iter_batched(
            || {
                let mut tree = KdTree::new(2).unwrap();
                for p in &points {
                    let _ = tree.insert(*p);
                }
                tree
            },
            |tree| {
                let mut rng = Rng::new(0xBADC_F00D_1234_5678);
                for _ in 0..256 {
                    let target =
                        Coordinate::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0);
                    black_box(tree.nearest_neighbour(&target));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_mtree_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("mtree");
    let points = gen_random_points(2048, 2000.0, 2000.0);
    group.bench_function("build_then_knn", |b| {
        b.iter_batched(
            || {
                let mut tree = MTree::new(4, 16, EuclideanDistance).unwrap();
                for p in &points {
                    let _ = tree.insert(*p);
                }
                tree
            },
            |tree| {
                let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
                let mut total = 0usize;
                for _ in 0..64 {
                    let target =
                        Coordinate::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0);
                    total += tree.search(&target).limit(10).count();
                }
                black_box(total);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rtree,
    bench_rstar,
    bench_hilbert,
    bench_quadtree,
    bench_kdtree_nearest,
    bench_mtree_search,
);
criterion_main!(benches);
