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

//! # Pipette Tree
//!
//! **Incremental tree searches for the pipette tip-change optimiser.**
//!
//! Both searches grow a single sequence one delivery at a time and never
//! backtrack. They trade optimality for speed on instances too large for the
//! exact DP.
//!
//! ## Architecture
//!
//! * **`state`**: the immutable `SearchState` of a partial sequence.
//! * **`nns`**: `NearestNeighbourSearch` with optional lookahead depth.
//! * **`greedy`**: `GreedySearch`, cost plus a `Heuristic` estimate.
//! * **`heuristic`**: the `Optimistic` and `CapacityAware` estimates.

pub mod greedy;
pub mod heuristic;
pub mod nns;
mod search;
pub mod state;
