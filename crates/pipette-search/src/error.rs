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

//! Errors surfaced by the solvers.
//!
//! A chain solver that runs out of time is not an error: it returns its
//! incumbent with `TerminationReason::TimeLimitReached`.

use pipette_model::error::InfeasibleCapacityError;
use std::fmt::Display;

/// A solver's self-reported cost disagrees with the from-scratch replay.
///
/// This is a defect in the solver, never a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistentReplayError {
    /// Cost reported by the solver (`Σ changed`).
    pub reported: usize,
    /// Cost recomputed by `independent_cost`.
    pub replayed: usize,
}

impl std::fmt::Display for InconsistentReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Solver reported {} tip changes but the replay needs {}",
            self.reported, self.replayed
        )
    }
}

impl std::error::Error for InconsistentReplayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// A reagent cannot be delivered with the configured pipette.
    InfeasibleCapacity(InfeasibleCapacityError),
    /// A produced sequence failed end-to-end verification.
    InconsistentReplay(InconsistentReplayError),
    /// A produced sequence does not deliver every (well, slot) pair exactly once.
    IncompleteSequence,
}

impl Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InfeasibleCapacity(e) => write!(f, "Infeasible capacity: {}", e),
            Self::InconsistentReplay(e) => write!(f, "Inconsistent replay: {}", e),
            Self::IncompleteSequence => {
                write!(f, "Sequence does not deliver every pair exactly once")
            }
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InfeasibleCapacity(e) => Some(e),
            Self::InconsistentReplay(e) => Some(e),
            Self::IncompleteSequence => None,
        }
    }
}

impl From<InfeasibleCapacityError> for SolveError {
    fn from(e: InfeasibleCapacityError) -> Self {
        Self::InfeasibleCapacity(e)
    }
}

impl From<InconsistentReplayError> for SolveError {
    fn from(e: InconsistentReplayError) -> Self {
        Self::InconsistentReplay(e)
    }
}
