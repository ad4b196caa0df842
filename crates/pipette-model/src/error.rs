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

//! Errors raised while assembling a well matrix or resolving tip capacities.

use crate::index::{PartId, WellIndex};
use std::fmt::Display;

/// Errors raised by `WellMatrixBuilder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A matrix must carry at least one reagent slot per well.
    NoSlots,
    /// A well does not have the slot arity of the matrix.
    SlotArityMismatch(SlotArityMismatchError),
}

/// Details about a well whose slot count differs from the matrix arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotArityMismatchError {
    /// The well that would have been added.
    pub well_index: WellIndex,
    /// The slot arity of the matrix.
    pub expected: usize,
    /// The number of parts supplied for the well.
    pub found: usize,
}

impl std::fmt::Display for SlotArityMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Well {} has {} parts but the matrix has {} slots",
            self.well_index.get(),
            self.found,
            self.expected
        )
    }
}

impl std::error::Error for SlotArityMismatchError {}

impl Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSlots => write!(f, "A well matrix needs at least one slot"),
            Self::SlotArityMismatch(e) => write!(f, "Slot arity mismatch: {}", e),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<SlotArityMismatchError> for ModelError {
    fn from(e: SlotArityMismatchError) -> Self {
        Self::SlotArityMismatch(e)
    }
}

/// A reagent whose capacity resolves to zero deliveries per tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfeasibleCapacityError {
    /// The reagent that cannot be delivered.
    pub part: PartId,
}

impl std::fmt::Display for InfeasibleCapacityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Part {} cannot be delivered: a single dose does not fit into one tip",
            self.part.get()
        )
    }
}

impl std::error::Error for InfeasibleCapacityError {}

/// A volume that cannot enter the capacity formula.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidVolumeError {
    /// Which volume was rejected (`"tip volume"`, `"dose"`, `"air gap"`).
    pub what: &'static str,
    /// The rejected value.
    pub value: f64,
}

impl std::fmt::Display for InvalidVolumeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid {}: {}", self.what, self.value)
    }
}

impl std::error::Error for InvalidVolumeError {}

/// Errors raised while building a `CapacityMap`.
#[derive(Debug, Clone, PartialEq)]
pub enum CapacityError {
    /// A volume is negative, zero where it must be positive, or not finite.
    InvalidVolume(InvalidVolumeError),
    /// A reagent resolves to capacity 0.
    Infeasible(InfeasibleCapacityError),
}

impl Display for CapacityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVolume(e) => write!(f, "Capacity error: {}", e),
            Self::Infeasible(e) => write!(f, "Infeasible capacity: {}", e),
        }
    }
}

impl std::error::Error for CapacityError {}

impl From<InvalidVolumeError> for CapacityError {
    fn from(e: InvalidVolumeError) -> Self {
        Self::InvalidVolume(e)
    }
}

impl From<InfeasibleCapacityError> for CapacityError {
    fn from(e: InfeasibleCapacityError) -> Self {
        Self::Infeasible(e)
    }
}
