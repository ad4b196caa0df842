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

//! Progress table printed to stdout while a solver runs.

use crate::{
    monitor::search_monitor::{SearchMonitor, SearchProgress},
    stats::SolverStatistics,
};
use pipette_model::{matrix::WellMatrix, sequence::Sequence};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
}

impl LogMonitor {
    /// Logs at most once per `log_interval`, reading the clock only on steps
    /// where `steps & clock_check_mask == 0`.
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
        }
    }

    #[inline(always)]
    fn print_header(&self, matrix: &WellMatrix) {
        println!(
            "Instance: {} wells x {} slots, {} parts, {} deliveries",
            matrix.num_wells(),
            matrix.num_slots(),
            matrix.num_parts(),
            matrix.num_operations()
        );
        println!(
            "{:<9} | {:<12} | {:<8} | {:<14} | {:<10} | {:<8}",
            "Elapsed", "Placed", "Cost", "Transitions", "Backend", "Cuts"
        );
        println!("{}", "-".repeat(76));
    }

    #[inline(always)]
    fn log_line(&mut self, progress: &SearchProgress, stats: &SolverStatistics) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.start_time).as_secs_f32();
        let placed = format!("{}/{}", progress.placed, progress.total);

        println!(
            "{:<9} | {:<12} | {:<8} | {:<14} | {:<10} | {:<8}",
            format!("{:.1}s", elapsed),
            placed,
            progress.cost,
            stats.transitions_evaluated,
            stats.backend_calls,
            stats.subtour_cuts
        );

        self.last_log_time = now;
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 0)
    }
}

impl std::fmt::Display for LogMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogMonitor(log_interval: {}s, clock_check_mask: {})",
            self.log_interval.as_secs(),
            self.clock_check_mask
        )
    }
}

impl SearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self, matrix: &WellMatrix) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.print_header(matrix);
    }

    fn on_step(&mut self, progress: &SearchProgress, statistics: &SolverStatistics) {
        if (statistics.steps & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_line(progress, statistics);
        }
    }

    fn on_exit_search(&mut self, sequence: &Sequence, statistics: &SolverStatistics) {
        println!("{}", "-".repeat(76));
        println!(
            "Search finished: {} tip changes for {} deliveries ({} saved).",
            sequence.cost(),
            sequence.len(),
            sequence.tips_saved()
        );
        print!("{}", statistics);
    }
}
