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

//! # MILP Chain Cover
//!
//! Exact chain covers through `good_lp` and the HiGHS engine.
//!
//! ## Unlimited capacity
//!
//! An asymmetric TSP over the depot and the wells. Every node has in- and
//! out-degree 1 and the objective counts the unsafe arcs on the tour. Subtours
//! are cut lazily: after each solve every cycle `C` of the successor map adds
//! `Σ x[i][j] (i, j ∈ C) ≤ |C| - 1`, and the model is rebuilt and solved again
//! until a single tour remains. The tour is split into chains at the depot and
//! at every unsafe arc.
//!
//! ## Limited capacity `k`
//!
//! No chain is longer than the subset, so `k` is first clamped to the number
//! of wells; a capacity reaching it is solved as unlimited. Otherwise only
//! depot arcs and safe well arcs exist. Every well has in- and out-degree 1,
//! continuous positions `u ∈ [1, k]` follow `u[j] - u[i] - k·x[i][j] ≥ 1 - k`
//! on well arcs, and the objective counts the arcs leaving the depot. The
//! position bounds cap each chain at `k` wells and forbid cycles among wells.
//!
//! ## Notes
//!
//! - The first-fit cover is computed before any solve and returned when the
//!   deadline passes or the engine fails.
//! - Every solve gets the time left until the deadline as its HiGHS time
//!   limit, so no single solve outlives the deadline by more than the
//!   engine's own polling interval.

use crate::{
    cover::{ChainCover, ChainCoverBackend, CoverStatus},
    greedy::GreedyBackend,
    graph::SubsetGraph,
    subtour,
};
use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable,
    solvers::highs::{HighsProblem, highs},
    variable, variables,
};
use pipette_model::capacity::Capacity;
use pipette_search::stats::SolverStatistics;
use std::time::Instant;

/// Why a MILP cover is not available.
#[derive(Debug)]
enum MilpFailure {
    Deadline,
    Engine(ResolutionError),
    /// The engine returned a solution that does not decode into a valid cover.
    Decode,
}

impl From<ResolutionError> for MilpFailure {
    fn from(err: ResolutionError) -> Self {
        MilpFailure::Engine(err)
    }
}

/// Chain covers from the HiGHS MILP engine.
///
/// Engine errors never abort a solve: the first-fit cover is used instead,
/// the failure is counted in `SolverStatistics::backend_failures` and the most
/// recent error is kept in `last_error`.
#[derive(Debug, Default)]
pub struct MilpBackend {
    last_error: Option<ResolutionError>,
}

type ArcVariables = Vec<Vec<Option<Variable>>>;

#[inline]
fn is_set<S: Solution>(solution: &S, var: Option<Variable>) -> bool {
    var.is_some_and(|v| solution.value(v) > 0.5)
}

#[inline]
fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Applies the time left until `deadline` to `problem`.
fn bounded(problem: HighsProblem, deadline: Option<Instant>) -> Result<HighsProblem, MilpFailure> {
    match deadline {
        None => Ok(problem),
        Some(deadline) => {
            let now = Instant::now();
            if now >= deadline {
                return Err(MilpFailure::Deadline);
            }
            Ok(problem.set_time_limit((deadline - now).as_secs_f64()))
        }
    }
}

/// Solves `problem`, reporting an engine error after the deadline as a timeout.
fn solve_bounded(
    problem: HighsProblem,
    deadline: Option<Instant>,
) -> Result<<HighsProblem as SolverModel>::Solution, MilpFailure> {
    match bounded(problem, deadline)?.solve() {
        Ok(solution) => Ok(solution),
        Err(_) if expired(deadline) => Err(MilpFailure::Deadline),
        Err(err) => Err(err.into()),
    }
}

impl MilpBackend {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine error behind the most recent fallback, if any.
    #[inline]
    pub fn last_error(&self) -> Option<&ResolutionError> {
        self.last_error.as_ref()
    }

    fn tour_successors(
        graph: &SubsetGraph,
        cuts: &[Vec<usize>],
        deadline: Option<Instant>,
    ) -> Result<Vec<usize>, MilpFailure> {
        let n = graph.num_nodes();
        let mut vars = variables!();
        let mut x: ArcVariables = vec![vec![None; n]; n];
        let mut objective = Expression::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let v = vars.add(variable().binary());
                if graph.weight(i, j) == 1 {
                    objective.add_mul(1.0, v);
                }
                x[i][j] = Some(v);
            }
        }

        let mut problem = vars.minimise(objective).using(highs);
        for i in 0..n {
            let mut outgoing = Expression::default();
            let mut incoming = Expression::default();
            for j in 0..n {
                if let Some(v) = x[i][j] {
                    outgoing.add_mul(1.0, v);
                }
                if let Some(v) = x[j][i] {
                    incoming.add_mul(1.0, v);
                }
            }
            problem = problem.with(outgoing.eq(1.0)).with(incoming.eq(1.0));
        }
        for cycle in cuts {
            let mut arcs = Expression::default();
            for &i in cycle {
                for &j in cycle {
                    if let Some(v) = x[i][j] {
                        arcs.add_mul(1.0, v);
                    }
                }
            }
            problem = problem.with(arcs.leq((cycle.len() - 1) as f64));
        }

        let solution = solve_bounded(problem, deadline)?;
        let mut successor = vec![0; n];
        for (i, row) in x.iter().enumerate() {
            if let Some(j) = (0..n).find(|&j| is_set(&solution, row[j])) {
                successor[i] = j;
            }
        }
        Ok(successor)
    }

    /// Splits a depot-rooted tour at the depot and at every unsafe arc.
    fn split_tour(graph: &SubsetGraph, successor: &[usize]) -> Vec<Vec<usize>> {
        let mut chains: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut node = successor[0];
        let mut steps = 0;
        while node != 0 && steps < successor.len() {
            if let Some(&prev) = current.last()
                && graph.weight(prev, node) == 1
            {
                chains.push(std::mem::take(&mut current));
            }
            current.push(node);
            node = successor[node];
            steps += 1;
        }
        if !current.is_empty() {
            chains.push(current);
        }
        chains
    }

    fn solve_unlimited(
        graph: &SubsetGraph,
        deadline: Option<Instant>,
        statistics: &mut SolverStatistics,
    ) -> Result<Vec<Vec<usize>>, MilpFailure> {
        let mut cuts: Vec<Vec<usize>> = Vec::new();
        loop {
            let successor = Self::tour_successors(graph, &cuts, deadline)?;
            statistics.on_milp_solve();

            let cycles = subtour::cycles(&successor);
            if cycles.len() <= 1 {
                return Ok(Self::split_tour(graph, &successor));
            }
            statistics.on_subtour_cuts(cycles.len() as u64);
            cuts.extend(cycles);
        }
    }

    fn solve_limited(
        graph: &SubsetGraph,
        limit: u32,
        deadline: Option<Instant>,
        statistics: &mut SolverStatistics,
    ) -> Result<Vec<Vec<usize>>, MilpFailure> {
        let n = graph.num_nodes();
        let limit = (limit as usize).min(graph.num_wells());
        if limit <= 1 {
            return Ok((1..n).map(|node| vec![node]).collect());
        }
        if limit >= graph.num_wells() {
            return Self::solve_unlimited(graph, deadline, statistics);
        }

        let k = limit as f64;
        let mut vars = variables!();
        let mut x: ArcVariables = vec![vec![None; n]; n];
        let mut objective = Expression::with_capacity(n);
        for j in 1..n {
            let from_depot = vars.add(variable().binary());
            objective.add_mul(1.0, from_depot);
            x[0][j] = Some(from_depot);
            x[j][0] = Some(vars.add(variable().binary()));
        }
        for i in 1..n {
            for j in 1..n {
                if graph.is_safe(i, j) {
                    x[i][j] = Some(vars.add(variable().binary()));
                }
            }
        }
        let u: Vec<Variable> = (0..n)
            .map(|_| vars.add(variable().min(1.0).max(k)))
            .collect();

        let mut problem = vars.minimise(objective).using(highs);
        for i in 1..n {
            let mut outgoing = Expression::default();
            let mut incoming = Expression::default();
            for j in 0..n {
                if let Some(v) = x[i][j] {
                    outgoing.add_mul(1.0, v);
                }
                if let Some(v) = x[j][i] {
                    incoming.add_mul(1.0, v);
                }
            }
            problem = problem.with(outgoing.eq(1.0)).with(incoming.eq(1.0));
        }
        for i in 1..n {
            for j in 1..n {
                if let Some(v) = x[i][j] {
                    problem = problem.with((u[j] - u[i] - k * v).geq(1.0 - k));
                }
            }
        }

        let solution = solve_bounded(problem, deadline)?;
        statistics.on_milp_solve();

        let mut successor = vec![0; n];
        for (i, row) in x.iter().enumerate().skip(1) {
            if let Some(j) = (0..n).find(|&j| is_set(&solution, row[j])) {
                successor[i] = j;
            }
        }
        let mut chains = Vec::new();
        for start in (1..n).filter(|&j| is_set(&solution, x[0][j])) {
            let mut chain = Vec::new();
            let mut node = start;
            while node != 0 && chain.len() < n {
                chain.push(node);
                node = successor[node];
            }
            chains.push(chain);
        }
        Ok(chains)
    }
}

impl ChainCoverBackend for MilpBackend {
    fn name(&self) -> &str {
        "MilpBackend"
    }

    fn solve_chain_cover(
        &mut self,
        graph: &SubsetGraph,
        capacity: Capacity,
        deadline: Option<Instant>,
        statistics: &mut SolverStatistics,
    ) -> ChainCover {
        statistics.on_backend_call();
        let incumbent = GreedyBackend::cover(graph, capacity);
        if graph.num_wells() <= 1 {
            return incumbent.with_status(CoverStatus::Optimal);
        }

        let solved = match capacity {
            Capacity::Unlimited => Self::solve_unlimited(graph, deadline, statistics),
            Capacity::Limited(limit) => Self::solve_limited(graph, limit, deadline, statistics),
        };
        let solved = solved.and_then(|chains| {
            let cover = ChainCover::new(chains, CoverStatus::Optimal);
            if cover.is_valid_for(graph, capacity) {
                Ok(cover)
            } else {
                Err(MilpFailure::Decode)
            }
        });

        // A solve that ran into the deadline may hand back a feasible but
        // unproven cover, or nothing usable at all.
        let timed_out = expired(deadline);
        match solved {
            Ok(cover) if cover.num_chains() <= incumbent.num_chains() => {
                if timed_out {
                    statistics.on_time_limit_hit();
                    cover.with_status(CoverStatus::TimeLimitReached)
                } else {
                    cover
                }
            }
            Err(MilpFailure::Deadline) => {
                statistics.on_time_limit_hit();
                incumbent.with_status(CoverStatus::TimeLimitReached)
            }
            _ if timed_out => {
                statistics.on_time_limit_hit();
                incumbent.with_status(CoverStatus::TimeLimitReached)
            }
            Err(MilpFailure::Engine(err)) => {
                self.last_error = Some(err);
                statistics.on_backend_failure();
                incumbent.with_status(CoverStatus::Fallback)
            }
            Ok(_) | Err(MilpFailure::Decode) => {
                statistics.on_backend_failure();
                incumbent.with_status(CoverStatus::Fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::index::WellIndex;
    use std::time::Duration;

    fn wells(n: usize) -> Vec<WellIndex> {
        (0..n).map(WellIndex::new).collect()
    }

    fn solve(graph: &SubsetGraph, capacity: Capacity) -> (ChainCover, SolverStatistics) {
        let mut stats = SolverStatistics::default();
        let cover = MilpBackend::new().solve_chain_cover(graph, capacity, None, &mut stats);
        (cover, stats)
    }

    #[test]
    fn test_safe_wells_form_one_chain() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(3), &[]);
        let (cover, stats) = solve(&graph, Capacity::Unlimited);
        assert_eq!(cover.num_chains(), 1);
        assert_eq!(cover.status, CoverStatus::Optimal);
        assert!(cover.is_valid_for(&graph, Capacity::Unlimited));
        assert!(stats.milp_solves >= 1);
    }

    #[test]
    fn test_capacity_two_needs_two_chains_for_three_wells() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(3), &[]);
        let (cover, _) = solve(&graph, Capacity::Limited(2));
        assert_eq!(cover.num_chains(), 2);
        assert_eq!(cover.status, CoverStatus::Optimal);
        assert!(cover.is_valid_for(&graph, Capacity::Limited(2)));
    }

    #[test]
    fn test_capacity_one_gives_singletons() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(3), &[]);
        let (cover, stats) = solve(&graph, Capacity::Limited(1));
        assert_eq!(cover.chains, vec![vec![1], vec![2], vec![3]]);
        assert_eq!(stats.milp_solves, 0);
    }

    #[test]
    fn test_beats_first_fit_ordering() {
        // First fit opens at 1, which only reaches 3; 2 is left alone.
        // Optimal: 2 -> 1 -> 3.
        let graph = SubsetGraph::from_unsafe_arcs(wells(3), &[(1, 2), (3, 1), (3, 2), (2, 3)]);
        assert_eq!(GreedyBackend::cover(&graph, Capacity::Unlimited).num_chains(), 2);
        let (cover, _) = solve(&graph, Capacity::Unlimited);
        assert_eq!(cover.chains, vec![vec![2, 1, 3]]);
        let (limited, _) = solve(&graph, Capacity::Limited(3));
        assert_eq!(limited.num_chains(), 1);
    }

    #[test]
    fn test_fully_unsafe_graph_needs_a_chain_per_well() {
        let arcs: Vec<(usize, usize)> = (1..=3)
            .flat_map(|i| (1..=3).filter(move |&j| j != i).map(move |j| (i, j)))
            .collect();
        let graph = SubsetGraph::from_unsafe_arcs(wells(3), &arcs);
        let (cover, _) = solve(&graph, Capacity::Unlimited);
        assert_eq!(cover.num_chains(), 3);
        let (limited, _) = solve(&graph, Capacity::Limited(2));
        assert_eq!(limited.num_chains(), 3);
    }

    #[test]
    fn test_expired_deadline_returns_incumbent() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(4), &[(1, 2)]);
        let mut stats = SolverStatistics::default();
        let deadline = Instant::now() - Duration::from_millis(1);
        let cover = MilpBackend::new().solve_chain_cover(
            &graph,
            Capacity::Unlimited,
            Some(deadline),
            &mut stats,
        );
        assert_eq!(cover.status, CoverStatus::TimeLimitReached);
        assert!(cover.is_valid_for(&graph, Capacity::Unlimited));
        assert_eq!(stats.time_limit_hits, 1);
        assert_eq!(stats.milp_solves, 0);
    }

    #[test]
    fn test_capacity_beyond_the_subset_is_solved_as_unlimited() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(6), &[(3, 4)]);
        for capacity in [Capacity::Limited(6), Capacity::Limited(4_000_000_000)] {
            let (cover, stats) = solve(&graph, capacity);
            assert_eq!(cover.status, CoverStatus::Optimal);
            assert_eq!(cover.num_chains(), 1);
            assert!(cover.is_valid_for(&graph, capacity));
            assert!(stats.milp_solves >= 1);
        }
        let (split, _) = solve(&graph, Capacity::Limited(3));
        assert_eq!(split.num_chains(), 2);
    }

    #[test]
    fn test_successful_solves_leave_no_error() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(4), &[(1, 2), (2, 3)]);
        let mut backend = MilpBackend::new();
        let mut stats = SolverStatistics::default();
        backend.solve_chain_cover(&graph, Capacity::Limited(2), None, &mut stats);
        assert!(backend.last_error().is_none());
        assert_eq!(stats.backend_failures, 0);
    }

    #[test]
    fn test_split_tour_breaks_at_unsafe_arcs() {
        let graph = SubsetGraph::from_unsafe_arcs(wells(3), &[(2, 3)]);
        // 0 -> 1 -> 2 -> 3 -> 0
        let chains = MilpBackend::split_tour(&graph, &[1, 2, 3, 0]);
        assert_eq!(chains, vec![vec![1, 2], vec![3]]);
    }
}
