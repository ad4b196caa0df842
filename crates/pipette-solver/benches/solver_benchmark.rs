// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pipette_model::{capacity::CapacityMap, generator::random_matrix, matrix::WellMatrix};
use pipette_search::reorder::Reordering;
use pipette_solver::{method::Method, solver::SolverBuilder};
use pipette_tree::heuristic::Heuristic;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

/// Plate layouts: (wells, reagents per slot).
const LAYOUTS: [(usize, &[usize]); 3] = [(8, &[1, 3, 4]), (16, &[2, 4, 4]), (24, &[3, 6, 8])];

fn instance(wells: usize, parts_per_slot: &[usize]) -> WellMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    random_matrix(&mut rng, wells, parts_per_slot).expect("layout has at least one slot")
}

fn bench_methods(c: &mut Criterion) {
    let methods = [
        Method::Chain,
        Method::ChainGreedy,
        Method::NearestNeighbour { depth: 1 },
        Method::Greedy {
            heuristic: Heuristic::CapacityAware,
        },
    ];

    let mut group = c.benchmark_group("solver_benchmark");
    for (wells, parts_per_slot) in LAYOUTS {
        let matrix = instance(wells, parts_per_slot);
        let capacities = CapacityMap::unlimited(matrix.num_parts());
        let label = format!("{}x{}", wells, parts_per_slot.len());
        group.throughput(Throughput::Elements(matrix.num_operations() as u64));

        for method in methods {
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), &label),
                &matrix,
                |b, matrix| {
                    let mut solver = SolverBuilder::new()
                        .with_method(method)
                        .with_reordering(Reordering::LeastOut)
                        .build();
                    b.iter(|| {
                        let outcome = solver
                            .solve(black_box(matrix), black_box(&capacities))
                            .expect("benchmark instance is feasible");
                        black_box(outcome.cost())
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_dp(c: &mut Criterion) {
    let mut group = c.benchmark_group("dp_benchmark");
    for wells in [2usize, 3, 4] {
        let matrix = instance(wells, &[2, 2]);
        let capacities = CapacityMap::unlimited(matrix.num_parts());
        group.bench_with_input(BenchmarkId::from_parameter(wells), &matrix, |b, matrix| {
            let mut solver = SolverBuilder::new().with_method(Method::Dp).build();
            b.iter(|| black_box(solver.solve(black_box(matrix), &capacities).map(|o| o.cost())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_methods, bench_dp);
criterion_main!(benches);
