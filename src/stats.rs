//! Time-weighted occupancy counter.
//!
//! The minimal statistics interface the components feed: they report
//! every change of a count (queue occupancy, loads in service) with the
//! clock at which it happened, and restart the baseline on warm-up.
//! Richer aggregation lives outside the kernel.

use crate::time::SimTime;

/// Integrates a piecewise-constant count over simulation time.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyCounter {
    /// Start of the current observation window.
    baseline: SimTime,
    last_time: SimTime,
    last_count: usize,
    /// ∫ count dt from `baseline` to `last_time`.
    area: f64,
    increments: u64,
    decrements: u64,
}

impl OccupancyCounter {
    /// Start observing at `time` with a count of zero.
    pub fn new(time: SimTime) -> Self {
        OccupancyCounter {
            baseline: time,
            last_time: time,
            last_count: 0,
            area: 0.0,
            increments: 0,
            decrements: 0,
        }
    }

    /// Record that the count is `count` from `time` on.
    pub fn observe_count(&mut self, count: usize, time: SimTime) {
        self.advance_to(time);
        if count > self.last_count {
            self.increments += (count - self.last_count) as u64;
        } else {
            self.decrements += (self.last_count - count) as u64;
        }
        self.last_count = count;
    }

    /// Restart the window at `time`, keeping the current count.
    pub fn warmed_up(&mut self, time: SimTime) {
        self.baseline = time;
        self.last_time = time;
        self.area = 0.0;
        self.increments = 0;
        self.decrements = 0;
    }

    fn advance_to(&mut self, time: SimTime) {
        if time > self.last_time {
            self.area += self.last_count as f64 * time.since(self.last_time);
            self.last_time = time;
        }
    }

    /// Count as of the last observation.
    pub fn last_count(&self) -> usize {
        self.last_count
    }

    /// Start of the current observation window.
    pub fn baseline(&self) -> SimTime {
        self.baseline
    }

    /// Total increase observed since the baseline.
    pub fn increments(&self) -> u64 {
        self.increments
    }

    /// Total decrease observed since the baseline.
    pub fn decrements(&self) -> u64 {
        self.decrements
    }

    /// Time-weighted area under the count up to `now`.
    pub fn area(&self, now: SimTime) -> f64 {
        let tail = if now > self.last_time {
            self.last_count as f64 * now.since(self.last_time)
        } else {
            0.0
        };
        self.area + tail
    }

    /// Time-average count over `[baseline, now]`; the current count for an
    /// empty window.
    pub fn average_count(&self, now: SimTime) -> f64 {
        let span = now.since(self.baseline);
        if span <= 0.0 {
            return self.last_count as f64;
        }
        self.area(now) / span
    }
}
