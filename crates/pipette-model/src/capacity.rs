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

//! # Tip Capacity
//!
//! How many consecutive deliveries of one reagent a single tip can perform.
//!
//! A tip of volume `V` aspirates `n` doses `d`, each followed by an air gap
//! `g`, so `n = floor(V / (d + g))`. The last dose needs no trailing air gap:
//! when the leftover volume still holds one more dose, `n` grows by one.
//!
//! ## Notes
//!
//! - A capacity of 0 means the reagent cannot be delivered by this pipette at
//!   all. It is surfaced as `InfeasibleCapacityError`, never solved around.
//! - `Capacity::Unlimited` models reagents whose volume is not tracked.

use crate::{
    error::{CapacityError, InfeasibleCapacityError, InvalidVolumeError},
    index::PartId,
    matrix::WellMatrix,
};
use num_traits::ToPrimitive;

/// Number of doses of size `dose` that fit into one tip.
///
/// # Examples
///
/// ```rust
/// use pipette_model::capacity::capacity;
///
/// // 10 / (1 + 1) = 5, the remainder 0 cannot hold another dose.
/// assert_eq!(capacity(10.0, 1.0, 1.0), 5);
/// // 5 / 2 = 2, the remainder 1 holds one more dose without air gap.
/// assert_eq!(capacity(5.0, 1.0, 1.0), 3);
/// // A dose larger than the tip.
/// assert_eq!(capacity(1.0, 2.0, 0.5), 0);
/// ```
pub fn capacity(tip_volume: f64, dose: f64, air_gap: f64) -> u32 {
    debug_assert!(
        dose > 0.0 && air_gap >= 0.0,
        "called `capacity` with non-positive dose or negative air gap: dose is {} and air gap is {}",
        dose,
        air_gap
    );

    let step = dose + air_gap;
    let whole = (tip_volume / step).floor();
    let mut n = whole.to_u32().unwrap_or(u32::MAX);
    if dose <= tip_volume - whole * step {
        n = n.saturating_add(1);
    }
    n
}

/// The delivery limit of one tip for one reagent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Capacity {
    /// The tip can serve any number of deliveries.
    #[default]
    Unlimited,
    /// The tip serves at most this many consecutive deliveries.
    Limited(u32),
}

impl Capacity {
    /// Returns the limit, or `None` when unlimited.
    #[inline]
    pub fn limit(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(k) => Some(*k),
        }
    }

    /// Returns `true` if the capacity is unlimited.
    #[inline]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Returns `true` if a tip that already performed `run` deliveries
    /// cannot perform another one.
    #[inline]
    pub fn is_exhausted_by(&self, run: usize) -> bool {
        match self {
            Self::Unlimited => false,
            Self::Limited(k) => run >= *k as usize,
        }
    }

    /// Minimum number of tips for `remaining` deliveries of one reagent.
    #[inline]
    pub fn tips_needed(&self, remaining: usize) -> usize {
        match self {
            _ if remaining == 0 => 0,
            Self::Unlimited => 1,
            Self::Limited(0) => remaining,
            Self::Limited(k) => remaining.div_ceil(*k as usize),
        }
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Limited(k) => write!(f, "{}", k),
        }
    }
}

/// Per-part capacities, indexed by `PartId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityMap {
    capacities: Vec<Capacity>,
}

impl CapacityMap {
    /// Every part unlimited.
    pub fn unlimited(num_parts: usize) -> Self {
        Self::uniform(num_parts, Capacity::Unlimited)
    }

    /// Every part gets the same capacity.
    pub fn uniform(num_parts: usize, capacity: Capacity) -> Self {
        Self {
            capacities: vec![capacity; num_parts],
        }
    }

    /// Resolves the capacity of every part of `matrix` from its dose.
    ///
    /// `dose_of` returns the volume delivered per well for a part. Volumes
    /// must be finite; tip volume and doses positive, air gaps non-negative.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pipette_model::capacity::{Capacity, CapacityMap};
    /// use pipette_model::index::PartId;
    /// use pipette_model::matrix::WellMatrix;
    ///
    /// let matrix = WellMatrix::from_rows(&[["a", "b"]]).unwrap();
    /// let caps = CapacityMap::from_doses(&matrix, 10.0, 1.0, |part| {
    ///     if part.get() == 0 { 1.0 } else { 4.0 }
    /// })
    /// .unwrap();
    /// assert_eq!(caps.get(PartId::new(0)), Capacity::Limited(5));
    /// assert_eq!(caps.get(PartId::new(1)), Capacity::Limited(2));
    /// ```
    pub fn from_doses<F>(
        matrix: &WellMatrix,
        tip_volume: f64,
        air_gap: f64,
        mut dose_of: F,
    ) -> Result<Self, CapacityError>
    where
        F: FnMut(PartId) -> f64,
    {
        if !tip_volume.is_finite() || tip_volume <= 0.0 {
            return Err(InvalidVolumeError {
                what: "tip volume",
                value: tip_volume,
            }
            .into());
        }
        if !air_gap.is_finite() || air_gap < 0.0 {
            return Err(InvalidVolumeError {
                what: "air gap",
                value: air_gap,
            }
            .into());
        }

        let mut capacities = Vec::with_capacity(matrix.num_parts());
        for part in matrix.parts() {
            let dose = dose_of(part);
            if !dose.is_finite() || dose <= 0.0 {
                return Err(InvalidVolumeError {
                    what: "dose",
                    value: dose,
                }
                .into());
            }
            let n = capacity(tip_volume, dose, air_gap);
            if n == 0 {
                return Err(InfeasibleCapacityError { part }.into());
            }
            capacities.push(Capacity::Limited(n));
        }
        Ok(Self { capacities })
    }

    /// Replaces the capacity of one part.
    pub fn with_capacity(mut self, part: PartId, capacity: Capacity) -> Self {
        self.set(part, capacity);
        self
    }

    /// Sets the capacity of one part.
    #[inline]
    pub fn set(&mut self, part: PartId, capacity: Capacity) {
        debug_assert!(
            part.get() < self.capacities.len(),
            "called `CapacityMap::set` with part out of bounds: the len is {} but the index is {}",
            self.capacities.len(),
            part.get()
        );

        self.capacities[part.get()] = capacity;
    }

    /// The capacity of a part. Parts beyond the map are unlimited.
    #[inline]
    pub fn get(&self, part: PartId) -> Capacity {
        self.capacities
            .get(part.get())
            .copied()
            .unwrap_or(Capacity::Unlimited)
    }

    /// Number of parts covered by the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    /// Returns `true` if the map covers no parts.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }

    /// Returns `true` if every part is unlimited.
    pub fn is_unlimited(&self) -> bool {
        self.capacities.iter().all(Capacity::is_unlimited)
    }

    /// Fails on the first part whose capacity is `Limited(0)`.
    pub fn ensure_deliverable(&self) -> Result<(), InfeasibleCapacityError> {
        match self
            .capacities
            .iter()
            .position(|c| *c == Capacity::Limited(0))
        {
            Some(i) => Err(InfeasibleCapacityError {
                part: PartId::new(i),
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for CapacityMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CapacityMap(")?;
        for (i, c) in self.capacities.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", i, c)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_counts_trailing_dose_without_gap() {
        assert_eq!(capacity(10.0, 1.0, 1.0), 5);
        assert_eq!(capacity(11.0, 1.0, 1.0), 6);
        assert_eq!(capacity(10.0, 0.33, 1.0), 8);
        assert_eq!(capacity(2.0, 2.0, 0.5), 1);
        assert_eq!(capacity(1.0, 2.0, 0.0), 0);
    }

    #[test]
    fn test_capacity_without_air_gap_is_plain_division() {
        assert_eq!(capacity(10.0, 2.0, 0.0), 5);
        assert_eq!(capacity(9.0, 2.0, 0.0), 4);
    }

    #[test]
    fn test_exhaustion_and_tips_needed() {
        let c = Capacity::Limited(3);
        assert!(!c.is_exhausted_by(2));
        assert!(c.is_exhausted_by(3));
        assert_eq!(c.tips_needed(0), 0);
        assert_eq!(c.tips_needed(3), 1);
        assert_eq!(c.tips_needed(4), 2);
        assert!(!Capacity::Unlimited.is_exhausted_by(usize::MAX));
        assert_eq!(Capacity::Unlimited.tips_needed(17), 1);
    }

    #[test]
    fn test_from_doses_rejects_zero_capacity() {
        let matrix = WellMatrix::from_rows(&[["a", "b"]]).unwrap();
        let err = CapacityMap::from_doses(&matrix, 1.0, 0.5, |p| {
            if p.get() == 1 { 5.0 } else { 0.25 }
        })
        .unwrap_err();
        assert_eq!(
            err,
            CapacityError::Infeasible(InfeasibleCapacityError {
                part: PartId::new(1)
            })
        );
    }

    #[test]
    fn test_from_doses_rejects_invalid_volumes() {
        let matrix = WellMatrix::from_rows(&[["a"]]).unwrap();
        assert!(matches!(
            CapacityMap::from_doses(&matrix, -1.0, 0.0, |_| 1.0),
            Err(CapacityError::InvalidVolume(_))
        ));
        assert!(matches!(
            CapacityMap::from_doses(&matrix, 10.0, f64::NAN, |_| 1.0),
            Err(CapacityError::InvalidVolume(_))
        ));
        assert!(matches!(
            CapacityMap::from_doses(&matrix, 10.0, 1.0, |_| 0.0),
            Err(CapacityError::InvalidVolume(_))
        ));
    }

    #[test]
    fn test_ensure_deliverable_reports_first_zero() {
        let caps = CapacityMap::unlimited(3).with_capacity(PartId::new(2), Capacity::Limited(0));
        assert_eq!(
            caps.ensure_deliverable(),
            Err(InfeasibleCapacityError {
                part: PartId::new(2)
            })
        );
        assert!(CapacityMap::uniform(3, Capacity::Limited(1))
            .ensure_deliverable()
            .is_ok());
    }

    #[test]
    fn test_unknown_parts_are_unlimited() {
        let caps = CapacityMap::uniform(1, Capacity::Limited(2));
        assert_eq!(caps.get(PartId::new(4)), Capacity::Unlimited);
        assert!(!caps.is_unlimited());
        assert!(CapacityMap::unlimited(2).is_unlimited());
    }
}
