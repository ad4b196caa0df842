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

//! Observation hooks for a running solver.
//!
//! Monitors only observe: solvers here run to completion (or to the chain
//! solver's own deadline), so there is no command channel back into the search.

use crate::stats::SolverStatistics;
use pipette_model::{matrix::WellMatrix, sequence::Sequence};

/// Snapshot handed to `SearchMonitor::on_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchProgress {
    /// Deliveries fixed so far (or lattice positions expanded).
    pub placed: usize,
    /// Deliveries in the instance.
    pub total: usize,
    /// Tip changes of the partial solution.
    pub cost: usize,
}

impl SearchProgress {
    #[inline]
    pub fn new(placed: usize, total: usize, cost: usize) -> Self {
        Self {
            placed,
            total,
            cost,
        }
    }
}

impl std::fmt::Display for SearchProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} placed, cost {}", self.placed, self.total, self.cost)
    }
}

pub trait SearchMonitor {
    fn name(&self) -> &str;
    fn on_enter_search(&mut self, matrix: &WellMatrix);
    fn on_step(&mut self, progress: &SearchProgress, statistics: &SolverStatistics);
    fn on_exit_search(&mut self, sequence: &Sequence, statistics: &SolverStatistics);
}

impl std::fmt::Debug for dyn SearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

impl std::fmt::Display for dyn SearchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}
