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

//! # Solver Facade
//!
//! One entry point for every method. The facade validates the capacities,
//! dispatches to the configured solver with the configured monitors, and
//! verifies the produced sequence end to end before handing it out.
//!
//! ## Verification
//!
//! - Every (well, slot) pair is delivered exactly once.
//! - The reported tip count equals the from-scratch replay of
//!   `independent_cost`.
//!
//! ## Usage
//!
//! ```rust
//! use pipette_model::{capacity::CapacityMap, matrix::WellMatrix};
//! use pipette_search::reorder::Reordering;
//! use pipette_solver::{method::Method, solver::SolverBuilder};
//!
//! let matrix = WellMatrix::from_rows(&[["p0", "r0"], ["p0", "r1"]]).unwrap();
//! let capacities = CapacityMap::unlimited(matrix.num_parts());
//!
//! let mut solver = SolverBuilder::new()
//!     .with_method(Method::NearestNeighbour { depth: 2 })
//!     .with_reordering(Reordering::LeastOut)
//!     .build();
//!
//! let outcome = solver.solve(&matrix, &capacities).unwrap();
//! assert_eq!(outcome.cost(), 3);
//! ```

use crate::method::Method;
use pipette_dp::dp::DpSolver;
use pipette_lp::{
    cover::ChainCoverBackend, greedy::GreedyBackend, milp::MilpBackend,
    reorder::ChainReordering, solver::ChainSolver,
};
use pipette_model::{
    capacity::CapacityMap, matrix::WellMatrix, oracle::independent_cost, sequence::Sequence,
};
use pipette_search::{
    error::{InconsistentReplayError, SolveError},
    monitor::{composite::CompositeMonitor, log::LogMonitor, search_monitor::SearchMonitor},
    reorder::Reordering,
    result::SolverOutcome,
};
use pipette_tree::{greedy::GreedySearch, nns::NearestNeighbourSearch};
use std::time::Duration;

/// Checks that `sequence` is complete and that its reported cost survives a
/// replay.
pub fn verify_sequence(
    sequence: &Sequence,
    matrix: &WellMatrix,
    capacities: &CapacityMap,
) -> Result<(), SolveError> {
    if !sequence.is_complete(matrix) {
        return Err(SolveError::IncompleteSequence);
    }
    let reported = sequence.cost();
    let replayed = independent_cost(sequence, matrix, capacities).cost;
    if reported != replayed {
        return Err(InconsistentReplayError { reported, replayed }.into());
    }
    Ok(())
}

pub struct Solver<'a> {
    method: Method,
    reordering: Reordering,
    subset_order: Option<ChainReordering>,
    time_limit: Option<Duration>,
    monitor: CompositeMonitor<'a>,
}

impl<'a> std::fmt::Debug for Solver<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("method", &self.method)
            .field("reordering", &self.reordering)
            .field("subset_order", &self.subset_order)
            .field("time_limit", &self.time_limit)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl<'a> Solver<'a> {
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn reordering(&self) -> Reordering {
        self.reordering
    }

    #[inline]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    #[inline]
    pub fn has_time_limit(&self) -> bool {
        self.time_limit.is_some()
    }

    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: SearchMonitor + 'a,
    {
        self.monitor.add_monitor(monitor);
    }

    fn chain_order(&self) -> ChainReordering {
        self.subset_order.unwrap_or(ChainReordering::Fixed(self.reordering))
    }

    fn run_chain<B>(
        &mut self,
        backend: B,
        matrix: &WellMatrix,
        capacities: &CapacityMap,
    ) -> Result<SolverOutcome, SolveError>
    where
        B: ChainCoverBackend,
    {
        let mut solver = ChainSolver::new(backend).with_order(self.chain_order());
        if let Some(limit) = self.time_limit {
            solver = solver.with_time_limit(limit);
        }
        solver.solve(matrix, capacities, &mut self.monitor)
    }

    pub fn solve(
        &mut self,
        matrix: &WellMatrix,
        capacities: &CapacityMap,
    ) -> Result<SolverOutcome, SolveError> {
        capacities.ensure_deliverable()?;

        let outcome = match self.method {
            Method::Dp => DpSolver::new().solve(matrix, capacities, &mut self.monitor)?,
            Method::Chain => self.run_chain(MilpBackend::new(), matrix, capacities)?,
            Method::ChainGreedy => self.run_chain(GreedyBackend::new(), matrix, capacities)?,
            Method::NearestNeighbour { depth } => NearestNeighbourSearch::new(depth)
                .with_reordering(self.reordering)
                .solve(matrix, capacities, &mut self.monitor)?,
            Method::Greedy { heuristic } => GreedySearch::new(heuristic)
                .with_reordering(self.reordering)
                .solve(matrix, capacities, &mut self.monitor)?,
        };

        verify_sequence(&outcome.sequence, matrix, capacities)?;
        Ok(outcome)
    }
}

pub struct SolverBuilder<'a> {
    method: Method,
    reordering: Reordering,
    subset_order: Option<ChainReordering>,
    time_limit: Option<Duration>,
    logging: bool,
    monitors: Vec<Box<dyn SearchMonitor + 'a>>,
}

impl<'a> Default for SolverBuilder<'a> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SolverBuilder<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            method: Method::default(),
            reordering: Reordering::default(),
            subset_order: None,
            time_limit: None,
            logging: false,
            monitors: Vec::new(),
        }
    }

    #[inline]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[inline]
    pub fn with_reordering(mut self, reordering: Reordering) -> Self {
        self.reordering = reordering;
        self
    }

    /// Orders subsets for the chain methods by a nearest-neighbour walk with
    /// `depth` subsets of lookahead, overriding the reordering for them.
    #[inline]
    pub fn with_subset_lookahead(mut self, depth: usize) -> Self {
        self.subset_order = Some(ChainReordering::NearestNeighbour { depth });
        self
    }

    /// Orders subsets for the chain methods greedily by the unsafe moves each
    /// leaves behind, overriding the reordering for them.
    #[inline]
    pub fn with_greedy_subset_order(mut self) -> Self {
        self.subset_order = Some(ChainReordering::Greedy);
        self
    }

    /// Bounds every chain cover solve. Other methods run to completion.
    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    #[inline]
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    #[inline]
    pub fn with_monitor<M>(mut self, monitor: M) -> Self
    where
        M: SearchMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
        self
    }

    pub fn build(self) -> Solver<'a> {
        let mut monitor = CompositeMonitor::from_vec(self.monitors);
        if self.logging {
            monitor.add_monitor(LogMonitor::default());
        }
        Solver {
            method: self.method,
            reordering: self.reordering,
            subset_order: self.subset_order,
            time_limit: self.time_limit,
            monitor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::{
        capacity::Capacity,
        generator::{random_matrix, uniform_matrix},
        index::{PartId, WellIndex},
        sequence::Operation,
    };
    use pipette_search::{monitor::search_monitor::SearchProgress, stats::SolverStatistics};
    use pipette_tree::heuristic::Heuristic;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::{cell::RefCell, rc::Rc};

    const METHODS: [Method; 6] = [
        Method::Dp,
        Method::Chain,
        Method::ChainGreedy,
        Method::NearestNeighbour { depth: 2 },
        Method::Greedy {
            heuristic: Heuristic::Optimistic,
        },
        Method::Greedy {
            heuristic: Heuristic::CapacityAware,
        },
    ];

    fn scenario() -> WellMatrix {
        WellMatrix::from_rows(&[
            ["p0", "r0", "c0", "t0"],
            ["p0", "r1", "c1", "t1"],
            ["p0", "r2", "c2", "t2"],
        ])
        .unwrap()
    }

    fn solve(method: Method, matrix: &WellMatrix, caps: &CapacityMap) -> SolverOutcome {
        SolverBuilder::new()
            .with_method(method)
            .with_reordering(Reordering::LeastOut)
            .build()
            .solve(matrix, caps)
            .unwrap_or_else(|e| panic!("{} failed: {}", method, e))
    }

    #[test]
    fn test_every_method_solves_the_scenario_with_ten_changes() {
        let m = scenario();
        let caps = CapacityMap::unlimited(m.num_parts());
        for method in METHODS {
            assert_eq!(solve(method, &m, &caps).cost(), 10, "{}", method);
        }
    }

    #[test]
    fn test_dp_is_never_worse_than_any_heuristic() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for round in 0..8 {
            let m = random_matrix(&mut rng, 3, &[2, 2]).unwrap();
            let caps = if round % 2 == 0 {
                CapacityMap::unlimited(m.num_parts())
            } else {
                CapacityMap::uniform(m.num_parts(), Capacity::Limited(2))
            };
            let exact = solve(Method::Dp, &m, &caps).cost();
            for method in METHODS {
                let cost = solve(method, &m, &caps).cost();
                assert!(exact <= cost, "round {}: dp {} > {} {}", round, exact, method, cost);
            }
        }
    }

    #[test]
    fn test_dynamic_subset_orders_drive_the_chain_methods() {
        let m = WellMatrix::from_rows(&[["a", "x"], ["b", "y"], ["b", "y"], ["a", "y"]]).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        for method in [Method::Chain, Method::ChainGreedy] {
            let natural = SolverBuilder::new()
                .with_method(method)
                .build()
                .solve(&m, &caps)
                .unwrap();
            assert_eq!(natural.cost(), 5, "{}", method);

            for builder in [
                SolverBuilder::new().with_subset_lookahead(3),
                SolverBuilder::new().with_greedy_subset_order(),
            ] {
                let outcome = builder.with_method(method).build().solve(&m, &caps).unwrap();
                assert_eq!(outcome.cost(), 4, "{}", method);
                assert!(outcome.statistics.lookahead_nodes > 0);
            }
        }
    }

    #[test]
    fn test_zero_capacity_is_rejected_for_every_method() {
        let m = uniform_matrix(2, 1).unwrap();
        let caps = CapacityMap::uniform(1, Capacity::Limited(0));
        for method in METHODS {
            let err = SolverBuilder::new()
                .with_method(method)
                .build()
                .solve(&m, &caps)
                .unwrap_err();
            assert!(matches!(err, SolveError::InfeasibleCapacity(_)), "{}", method);
        }
    }

    #[test]
    fn test_time_limit_is_reported() {
        let m = uniform_matrix(4, 1).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let mut solver = SolverBuilder::new()
            .with_method(Method::Chain)
            .with_time_limit(Duration::ZERO)
            .build();
        assert!(solver.has_time_limit());
        let outcome = solver.solve(&m, &caps).unwrap();
        assert!(outcome.is_time_limited());
        assert_eq!(outcome.cost(), 1);
    }

    #[test]
    fn test_verification_rejects_broken_sequences() {
        let m = WellMatrix::from_rows(&[["a"], ["a"]]).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let a = PartId::new(0);

        let incomplete: Sequence = vec![Operation::new(a, WellIndex::new(0), true)].into();
        assert_eq!(
            verify_sequence(&incomplete, &m, &caps),
            Err(SolveError::IncompleteSequence)
        );

        let wasteful: Sequence = vec![
            Operation::new(a, WellIndex::new(0), true),
            Operation::new(a, WellIndex::new(1), true),
        ]
        .into();
        assert_eq!(
            verify_sequence(&wasteful, &m, &caps),
            Err(SolveError::InconsistentReplay(InconsistentReplayError {
                reported: 2,
                replayed: 1
            }))
        );

        let lazy: Sequence = vec![
            Operation::new(a, WellIndex::new(1), true),
            Operation::new(a, WellIndex::new(0), false),
        ]
        .into();
        assert_eq!(verify_sequence(&lazy, &m, &caps), Ok(()));
    }

    struct Counter {
        events: Rc<RefCell<(usize, usize, usize)>>,
    }

    impl SearchMonitor for Counter {
        fn name(&self) -> &str {
            "Counter"
        }

        fn on_enter_search(&mut self, _matrix: &WellMatrix) {
            self.events.borrow_mut().0 += 1;
        }

        fn on_step(&mut self, _progress: &SearchProgress, _statistics: &SolverStatistics) {
            self.events.borrow_mut().1 += 1;
        }

        fn on_exit_search(&mut self, _sequence: &Sequence, _statistics: &SolverStatistics) {
            self.events.borrow_mut().2 += 1;
        }
    }

    #[test]
    fn test_monitors_observe_the_search() {
        let events = Rc::new(RefCell::new((0, 0, 0)));
        let m = uniform_matrix(3, 2).unwrap();
        let caps = CapacityMap::unlimited(m.num_parts());
        let mut solver = SolverBuilder::new()
            .with_method(Method::NearestNeighbour { depth: 1 })
            .with_monitor(Counter {
                events: Rc::clone(&events),
            })
            .with_logging(true)
            .build();
        solver.solve(&m, &caps).unwrap();
        assert_eq!(*events.borrow(), (1, 6, 1));
    }
}
