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

//! # Pipette Model
//!
//! **The shared data model and cost oracle of the pipette tip-change optimiser.**
//!
//! A well matrix lists, for every well, one reagent per slot. Every solver
//! orders the resulting `wells · slots` deliveries so that as few tips as
//! possible are used, without carrying a reagent into a well that must not
//! receive it and without exceeding the delivery capacity of a tip.
//!
//! ## Architecture
//!
//! * **`index`**: strongly typed `WellIndex`, `SlotIndex` and `PartId`.
//! * **`matrix`**: the immutable `WellMatrix`, its builder and derived `Subset`s.
//! * **`capacity`**: the tip capacity formula and the per-part `CapacityMap`.
//! * **`sequence`**: `Delivery`, `Operation`, `Sequence` and `route_cost`.
//! * **`mask`**: the `AddedMask` of delivered (well, slot) pairs.
//! * **`oracle`**: the `CostOracle` and the from-scratch `independent_cost` replay.
//! * **`generator`**: synthetic instances.
//! * **`error`**: model and capacity errors.

pub mod capacity;
pub mod error;
pub mod generator;
pub mod index;
pub mod mask;
pub mod matrix;
pub mod oracle;
pub mod sequence;
