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

//! The solving methods the facade can dispatch to.

use pipette_tree::heuristic::Heuristic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// Exact dynamic program over the full lattice. Only for tiny instances.
    Dp,
    /// Per-reagent chain covers solved by the MILP backend.
    #[default]
    Chain,
    /// Per-reagent chain covers solved by the first-fit backend.
    ChainGreedy,
    /// Incremental nearest neighbour with `depth` deliveries of lookahead.
    NearestNeighbour { depth: usize },
    /// Incremental best-first search guided by `heuristic`.
    Greedy { heuristic: Heuristic },
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Dp => write!(f, "Dp"),
            Method::Chain => write!(f, "Chain(milp)"),
            Method::ChainGreedy => write!(f, "Chain(greedy)"),
            Method::NearestNeighbour { depth } => write!(f, "NearestNeighbour(depth: {})", depth),
            Method::Greedy { heuristic } => write!(f, "Greedy({})", heuristic),
        }
    }
}
