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

//! Records of the position × delivery lattice.
//!
//! Record `(p, o)` is the cheapest known way to perform `p + 1` deliveries
//! ending with delivery `o`. It owns the mask of deliveries on its path and
//! the length of the tip run that ends at `o`. Masks and runs are only needed
//! for the layer being extended, so finished layers are compacted to their
//! back links.

use pipette_model::mask::AddedMask;

/// A live record of the layer currently being extended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Tip changes of the best path ending here.
    pub cost: usize,
    /// Deliveries performed on that path, including this one.
    pub mask: AddedMask,
    /// Consecutive deliveries served by the current tip, including this one.
    pub run: usize,
}

/// The back link kept for every record after its layer is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Link {
    /// Delivery index at the previous position, `None` at position 0.
    pub prev: Option<usize>,
    /// `true` if a fresh tip is taken for this delivery.
    pub changed: bool,
}

/// One lattice position: an optional record per delivery.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    records: Vec<Option<Record>>,
    links: Vec<Link>,
}

impl Layer {
    pub fn new(num_deliveries: usize) -> Self {
        Self {
            records: vec![None; num_deliveries],
            links: vec![Link::default(); num_deliveries],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn set(&mut self, delivery: usize, record: Record, link: Link) {
        debug_assert!(
            delivery < self.records.len(),
            "called `Layer::set` with delivery out of bounds: the len is {} but the index is {}",
            self.records.len(),
            delivery
        );

        self.records[delivery] = Some(record);
        self.links[delivery] = link;
    }

    #[inline]
    pub fn record(&self, delivery: usize) -> Option<&Record> {
        self.records[delivery].as_ref()
    }

    /// Iterates over `(delivery, record)` of reachable records.
    pub fn reachable(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (i, r)))
    }

    /// The cheapest reachable record; ties go to the lowest delivery index.
    pub fn best(&self) -> Option<(usize, &Record)> {
        let mut best: Option<(usize, &Record)> = None;
        for (i, r) in self.reachable() {
            if best.is_none_or(|(_, b)| r.cost < b.cost) {
                best = Some((i, r));
            }
        }
        best
    }

    /// Drops the records, keeping only the back links.
    pub fn into_links(self) -> Vec<Link> {
        self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cost: usize) -> Record {
        Record {
            cost,
            mask: AddedMask::new(1, 1),
            run: 1,
        }
    }

    #[test]
    fn test_best_prefers_first_on_ties() {
        let mut layer = Layer::new(4);
        layer.set(1, record(3), Link::default());
        layer.set(2, record(2), Link::default());
        layer.set(3, record(2), Link::default());
        let (i, r) = layer.best().unwrap();
        assert_eq!(i, 2);
        assert_eq!(r.cost, 2);
        assert_eq!(layer.reachable().count(), 3);
    }

    #[test]
    fn test_empty_layer_has_no_best() {
        let layer = Layer::new(3);
        assert!(layer.best().is_none());
        assert_eq!(layer.len(), 3);
    }

    #[test]
    fn test_links_survive_compaction() {
        let mut layer = Layer::new(2);
        let link = Link {
            prev: Some(1),
            changed: true,
        };
        layer.set(0, record(1), link);
        assert_eq!(layer.into_links()[0], link);
    }
}
