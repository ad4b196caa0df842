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

//! Solver outcomes.
//!
//! Every solver returns a complete sequence. The only way a solver stops
//! early is the chain solver's time limit; its incumbent is still a valid
//! sequence, flagged with `TerminationReason::TimeLimitReached`.

use crate::stats::SolverStatistics;
use pipette_model::sequence::Sequence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The solver ran to completion.
    Completed,
    /// A time budget ran out; at least one chain cover is an incumbent that
    /// may be suboptimal.
    TimeLimitReached(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Completed => write!(f, "Completed"),
            TerminationReason::TimeLimitReached(reason) => {
                write!(f, "Time Limit Reached: {}", reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverOutcome {
    pub sequence: Sequence,
    pub reason: TerminationReason,
    pub statistics: SolverStatistics,
}

impl SolverOutcome {
    #[inline]
    pub fn new(sequence: Sequence, reason: TerminationReason, statistics: SolverStatistics) -> Self {
        Self {
            sequence,
            reason,
            statistics,
        }
    }

    #[inline]
    pub fn completed(sequence: Sequence, statistics: SolverStatistics) -> Self {
        Self::new(sequence, TerminationReason::Completed, statistics)
    }

    #[inline]
    pub fn time_limited<S>(sequence: Sequence, reason: S, statistics: SolverStatistics) -> Self
    where
        S: Into<String>,
    {
        Self::new(
            sequence,
            TerminationReason::TimeLimitReached(reason.into()),
            statistics,
        )
    }

    /// Number of tip changes of the sequence.
    #[inline]
    pub fn cost(&self) -> usize {
        self.sequence.cost()
    }

    #[inline]
    pub fn is_time_limited(&self) -> bool {
        matches!(self.reason, TerminationReason::TimeLimitReached(_))
    }
}

impl std::fmt::Display for SolverOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solver Outcome:")?;
        writeln!(f, "  Tip changes: {}", self.cost())?;
        writeln!(f, "  Operations:  {}", self.sequence.len())?;
        writeln!(f, "  Reason:      {}", self.reason)?;
        write!(f, "{}", self.statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_model::{
        index::{PartId, WellIndex},
        sequence::Operation,
    };

    #[test]
    fn test_constructors_set_reason() {
        let seq: Sequence = vec![Operation::new(PartId::new(0), WellIndex::new(0), true)].into();
        let done = SolverOutcome::completed(seq.clone(), SolverStatistics::default());
        assert!(!done.is_time_limited());
        assert_eq!(done.cost(), 1);

        let late = SolverOutcome::time_limited(seq, "budget of 1s", SolverStatistics::default());
        assert!(late.is_time_limited());
        assert_eq!(late.reason.to_string(), "Time Limit Reached: budget of 1s");
    }
}
