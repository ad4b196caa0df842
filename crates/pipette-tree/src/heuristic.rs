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

//! Lower-bound style estimates of the tip changes still to come.

use crate::state::SearchState;
use pipette_model::capacity::CapacityMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Heuristic {
    /// One tip per reagent with deliveries left.
    Optimistic,
    /// `ceil(remaining / k)` tips per reagent, where the reagent of the last
    /// operation may continue with the tip in hand.
    #[default]
    CapacityAware,
}

impl Heuristic {
    pub fn estimate(&self, state: &SearchState, capacities: &CapacityMap) -> usize {
        match self {
            Heuristic::Optimistic => state.remaining_parts().count(),
            Heuristic::CapacityAware => {
                let tips: usize = state
                    .remaining_parts()
                    .map(|(part, remaining)| capacities.get(part).tips_needed(remaining))
                    .sum();
                match state.last() {
                    Some(last) if state.remaining_of(last.part) > 0 => tips.saturating_sub(1),
                    _ => tips,
                }
            }
        }
    }
}

impl std::fmt::Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Heuristic::Optimistic => write!(f, "Optimistic"),
            Heuristic::CapacityAware => write!(f, "CapacityAware"),
        }
    }
}
