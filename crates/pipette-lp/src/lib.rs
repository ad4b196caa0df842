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

//! # Pipette LP
//!
//! **Per-reagent chain covers for the pipette tip-change optimiser.**
//!
//! Subsets (all wells receiving one reagent) are solved one after another. Each
//! subset becomes a small depot graph whose unsafe arcs come from the subsets
//! already delivered, and a backend covers it with as few capacity-bounded
//! chains as possible. One chain is one tip.
//!
//! ## Architecture
//!
//! * **`graph`**: the progressive `ContaminationMatrix` and the per-subset `SubsetGraph`.
//! * **`cover`**: `ChainCover` and the `ChainCoverBackend` trait.
//! * **`milp`**: the exact `MilpBackend` on `good_lp` with lazy subtour cuts.
//! * **`greedy`**: the first-fit `GreedyBackend`, also the MILP incumbent.
//! * **`subtour`**: cycle extraction from successor maps.
//! * **`reorder`**: subset orders, including the lookahead and countall orders.
//! * **`solver`**: the `ChainSolver` driving it all, with the redundancy fix.

pub mod cover;
pub mod graph;
pub mod greedy;
pub mod milp;
pub mod reorder;
pub mod solver;
pub mod subtour;
