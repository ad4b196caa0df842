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

//! Fans every event out to a list of monitors, in insertion order.

use crate::{
    monitor::search_monitor::{SearchMonitor, SearchProgress},
    stats::SolverStatistics,
};
use pipette_model::{matrix::WellMatrix, sequence::Sequence};

#[derive(Default)]
pub struct CompositeMonitor<'a> {
    monitors: Vec<Box<dyn SearchMonitor + 'a>>,
}

impl<'a> std::fmt::Debug for CompositeMonitor<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMonitor")
            .field("monitors", &self.names().join(", "))
            .finish()
    }
}

impl<'a> std::fmt::Display for CompositeMonitor<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompositeMonitor([{}])", self.names().join(", "))
    }
}

impl<'a> CompositeMonitor<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    #[inline]
    pub fn from_vec(monitors: Vec<Box<dyn SearchMonitor + 'a>>) -> Self {
        Self { monitors }
    }

    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: SearchMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    #[inline]
    pub fn add_monitor_boxed(&mut self, monitor: Box<dyn SearchMonitor + 'a>) {
        self.monitors.push(monitor);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    fn names(&self) -> Vec<&str> {
        self.monitors.iter().map(|m| m.name()).collect()
    }
}

impl<'a> SearchMonitor for CompositeMonitor<'a> {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter_search(&mut self, matrix: &WellMatrix) {
        for monitor in self.monitors.iter_mut() {
            monitor.on_enter_search(matrix);
        }
    }

    fn on_step(&mut self, progress: &SearchProgress, statistics: &SolverStatistics) {
        for monitor in self.monitors.iter_mut() {
            monitor.on_step(progress, statistics);
        }
    }

    fn on_exit_search(&mut self, sequence: &Sequence, statistics: &SolverStatistics) {
        for monitor in self.monitors.iter_mut() {
            monitor.on_exit_search(sequence, statistics);
        }
    }
}
