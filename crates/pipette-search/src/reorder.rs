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

//! # Reordering Heuristics
//!
//! Order-sensitive solvers consume subsets (chain solver) or deliveries (tree
//! search) in a starting order. The order is chosen before solving.
//!
//! ## Strategies
//!
//! - `Natural`: subsets by first appearance well by well; deliveries well-major.
//! - `Random`: a `ChaCha8Rng` shuffle. Without a seed the system clock seeds
//!   it. For deliveries the individual deliveries are shuffled.
//! - `LeastOut`: subsets by ascending `|wells| · (total_wells - |wells|)`, the
//!   number of arcs leaving the subset in the well graph. Stable.
//! - `SameTogether`: subsets grouped by slot, each group sorted by the
//!   `LeastOut` metric, groups sorted by their summed metric, concatenated.

use pipette_model::{
    matrix::{Subset, WellMatrix},
    sequence::Delivery,
};
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reordering {
    #[default]
    Natural,
    Random {
        seed: Option<u64>,
    },
    LeastOut,
    SameTogether,
}

impl std::fmt::Display for Reordering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reordering::Natural => write!(f, "Natural"),
            Reordering::Random { seed: Some(seed) } => write!(f, "Random(seed: {})", seed),
            Reordering::Random { seed: None } => write!(f, "Random(time-seeded)"),
            Reordering::LeastOut => write!(f, "LeastOut"),
            Reordering::SameTogether => write!(f, "SameTogether"),
        }
    }
}

/// Number of arcs leaving `subset` in the complete well graph.
#[inline]
pub fn out_degree(subset: &Subset, total_wells: usize) -> usize {
    subset.len() * total_wells.saturating_sub(subset.len())
}

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            ChaCha8Rng::seed_from_u64(nanos)
        }
    }
}

fn least_out(subsets: &mut [Subset], total_wells: usize) {
    subsets.sort_by_key(|s| out_degree(s, total_wells));
}

fn same_together(subsets: Vec<Subset>, matrix: &WellMatrix) -> Vec<Subset> {
    let total_wells = matrix.num_wells();
    let mut groups: Vec<Vec<Subset>> = vec![Vec::new(); matrix.num_slots()];
    for subset in subsets {
        groups[subset.slot().get()].push(subset);
    }
    for group in groups.iter_mut() {
        least_out(group, total_wells);
    }
    groups.sort_by_key(|g| g.iter().map(|s| out_degree(s, total_wells)).sum::<usize>());
    groups.into_iter().flatten().collect()
}

/// Orders `subsets` (typically `matrix.subsets()`) by `reordering`.
pub fn reorder_subsets(
    mut subsets: Vec<Subset>,
    matrix: &WellMatrix,
    reordering: Reordering,
) -> Vec<Subset> {
    match reordering {
        Reordering::Natural => subsets,
        Reordering::Random { seed } => {
            subsets.shuffle(&mut rng_for(seed));
            subsets
        }
        Reordering::LeastOut => {
            least_out(&mut subsets, matrix.num_wells());
            subsets
        }
        Reordering::SameTogether => same_together(subsets, matrix),
    }
}

/// Flattens subsets into deliveries, subset by subset.
pub fn subset_deliveries(subsets: &[Subset]) -> Vec<Delivery> {
    subsets
        .iter()
        .flat_map(|s| s.wells().iter().map(move |&w| Delivery::new(s.part(), w)))
        .collect()
}

/// Deliveries of `matrix` well by well, slot by slot.
pub fn well_major_deliveries(matrix: &WellMatrix) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(matrix.num_operations());
    for well in matrix.wells() {
        deliveries.extend(
            matrix
                .well_parts(well)
                .iter()
                .map(|&part| Delivery::new(part, well)),
        );
    }
    deliveries
}

/// The starting delivery order for tree search.
pub fn delivery_order(matrix: &WellMatrix, reordering: Reordering) -> Vec<Delivery> {
    match reordering {
        Reordering::Natural => well_major_deliveries(matrix),
        Reordering::Random { seed } => {
            let mut deliveries = well_major_deliveries(matrix);
            deliveries.shuffle(&mut rng_for(seed));
            deliveries
        }
        Reordering::LeastOut | Reordering::SameTogether => {
            subset_deliveries(&reorder_subsets(matrix.subsets(), matrix, reordering))
        }
    }
}
