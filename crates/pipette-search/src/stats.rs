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

//! Counters collected while a solver runs.
//!
//! Every solver owns one `SolverStatistics` and bumps the counters that apply
//! to it; the rest stay at zero.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverStatistics {
    /// Solver steps (lattice positions, placed deliveries or subsets).
    pub steps: u64,
    /// Oracle transitions evaluated.
    pub transitions_evaluated: u64,
    /// Lookahead states expanded by tree search.
    pub lookahead_nodes: u64,
    /// Chain-cover backend invocations, one per non-trivial subset.
    pub backend_calls: u64,
    /// MILP solves, including resolves after subtour cuts.
    pub milp_solves: u64,
    /// Subtour elimination constraints added.
    pub subtour_cuts: u64,
    /// Backend calls that stopped at the time limit.
    pub time_limit_hits: u64,
    /// Backend calls that fell back to the greedy cover after an engine error.
    pub backend_failures: u64,
    /// Tip changes removed by the redundancy fix.
    pub redundant_changes_removed: u64,
    pub time_total: Duration,
}

impl SolverStatistics {
    #[inline]
    pub fn on_step(&mut self) {
        self.steps = self.steps.saturating_add(1);
    }

    #[inline]
    pub fn on_transition_evaluated(&mut self) {
        self.transitions_evaluated = self.transitions_evaluated.saturating_add(1);
    }

    #[inline]
    pub fn on_lookahead_node(&mut self) {
        self.lookahead_nodes = self.lookahead_nodes.saturating_add(1);
    }

    #[inline]
    pub fn on_backend_call(&mut self) {
        self.backend_calls = self.backend_calls.saturating_add(1);
    }

    #[inline]
    pub fn on_milp_solve(&mut self) {
        self.milp_solves = self.milp_solves.saturating_add(1);
    }

    #[inline]
    pub fn on_subtour_cuts(&mut self, cuts: u64) {
        self.subtour_cuts = self.subtour_cuts.saturating_add(cuts);
    }

    #[inline]
    pub fn on_time_limit_hit(&mut self) {
        self.time_limit_hits = self.time_limit_hits.saturating_add(1);
    }

    #[inline]
    pub fn on_backend_failure(&mut self) {
        self.backend_failures = self.backend_failures.saturating_add(1);
    }

    #[inline]
    pub fn on_redundant_changes_removed(&mut self, removed: u64) {
        self.redundant_changes_removed = self.redundant_changes_removed.saturating_add(removed);
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solver Statistics:")?;
        writeln!(f, "  Steps:                     {}", self.steps)?;
        writeln!(f, "  Transitions evaluated:     {}", self.transitions_evaluated)?;
        writeln!(f, "  Lookahead nodes:           {}", self.lookahead_nodes)?;
        writeln!(f, "  Backend calls:             {}", self.backend_calls)?;
        writeln!(f, "  MILP solves:               {}", self.milp_solves)?;
        writeln!(f, "  Subtour cuts:              {}", self.subtour_cuts)?;
        writeln!(f, "  Time limit hits:           {}", self.time_limit_hits)?;
        writeln!(f, "  Backend failures:          {}", self.backend_failures)?;
        writeln!(f, "  Redundant changes removed: {}", self.redundant_changes_removed)?;
        writeln!(f, "  Total time:                {:.2?}", self.time_total)?;
        Ok(())
    }
}
