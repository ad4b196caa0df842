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

//! Synthetic well matrices for tests and benchmarks.
//!
//! - `random_matrix`: every slot draws uniformly from its own reagent pool.
//! - `uniform_matrix`: every well holds the same reagents (best case).
//! - `distinct_matrix`: no reagent is shared between wells (worst case).

use crate::{
    error::ModelError,
    matrix::{WellMatrix, WellMatrixBuilder},
};
use rand::Rng;

fn part_name(slot: usize, choice: usize) -> String {
    format!("s{}p{}", slot, choice)
}

/// A matrix of `num_wells` wells; slot `i` draws from `parts_per_slot[i]`
/// reagents. A pool size of 0 is treated as 1.
pub fn random_matrix<R>(
    rng: &mut R,
    num_wells: usize,
    parts_per_slot: &[usize],
) -> Result<WellMatrix, ModelError>
where
    R: Rng + ?Sized,
{
    let mut builder = WellMatrixBuilder::new(parts_per_slot.len());
    let mut row = Vec::with_capacity(parts_per_slot.len());
    for _ in 0..num_wells {
        row.clear();
        for (slot, &pool) in parts_per_slot.iter().enumerate() {
            row.push(part_name(slot, rng.random_range(0..pool.max(1))));
        }
        builder.add_well(&row)?;
    }
    builder.build()
}

/// Every well holds reagent `s{i}p0` at slot `i`.
pub fn uniform_matrix(num_wells: usize, num_slots: usize) -> Result<WellMatrix, ModelError> {
    let mut builder = WellMatrixBuilder::new(num_slots);
    let row: Vec<String> = (0..num_slots).map(|slot| part_name(slot, 0)).collect();
    for _ in 0..num_wells {
        builder.add_well(&row)?;
    }
    builder.build()
}

/// Well `w` holds reagent `s{i}p{w}` at slot `i`.
pub fn distinct_matrix(num_wells: usize, num_slots: usize) -> Result<WellMatrix, ModelError> {
    let mut builder = WellMatrixBuilder::new(num_slots);
    for well in 0..num_wells {
        let row: Vec<String> = (0..num_slots).map(|slot| part_name(slot, well)).collect();
        builder.add_well(&row)?;
    }
    builder.build()
}

/// Number of distinct parts in each slot of `matrix`.
pub fn parts_per_slot(matrix: &WellMatrix) -> Vec<usize> {
    let mut counts = vec![0usize; matrix.num_slots()];
    for part in matrix.parts() {
        counts[matrix.part_slot(part).get()] += 1;
    }
    counts
}
