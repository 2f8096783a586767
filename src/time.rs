//! Logical time for the simulation clock.
//!
//! Represents a point on the simulation's continuous time axis with no
//! dependency on `std::time`. Time advances only when the engine pops
//! the next event, never from wall-clock observation.

use std::cmp::Ordering;

/// A logical timestamp in simulation time.
///
/// Wraps an `f64` and orders with `f64::total_cmp` so it can key a heap.
/// The engine refuses to schedule at a non-finite time, so every time
/// that reaches the future event list is finite.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(f64);

impl SimTime {
    /// The zero-point of simulation time.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Create a `SimTime` from a raw value. `-0.0` becomes `0.0`.
    #[inline]
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            SimTime::ZERO
        } else {
            SimTime(value)
        }
    }

    /// Return the raw value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns `true` unless the value is NaN or infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// The absolute time that is `delay` units after `self`.
    #[inline]
    pub fn plus(self, delay: f64) -> SimTime {
        SimTime::new(self.0 + delay)
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: SimTime) -> bool {
        self < other
    }

    /// Elapsed time from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::ZERO
    }
}

impl From<f64> for SimTime {
    fn from(value: f64) -> Self {
        SimTime::new(value)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={}", self.0)
    }
}
