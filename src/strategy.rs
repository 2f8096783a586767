//! Run strategies: when to stop and when warm-up ends.
//!
//! A strategy is consulted by the engine before every loop iteration.
//! [`RunConfig`] is the plain-data configuration surface that selects a
//! strategy variant and its parameters.

use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::simulation::RunStatus;
use crate::time::SimTime;

/// Stop condition plus optional warm-up threshold.
///
/// Generic over the root model so conditional strategies can stop on
/// system state, not just on the engine counters.
pub trait RunStrategy<M: ?Sized> {
    /// Return `false` to stop the main loop before the next pop.
    fn should_continue(&mut self, status: &RunStatus, model: &M) -> bool;

    /// Clock value at which the engine applies warm-up, if any.
    fn warmup_end_time(&self) -> Option<SimTime> {
        None
    }
}

impl<M: ?Sized, S: RunStrategy<M> + ?Sized> RunStrategy<M> for Box<S> {
    fn should_continue(&mut self, status: &RunStatus, model: &M) -> bool {
        (**self).should_continue(status, model)
    }

    fn warmup_end_time(&self) -> Option<SimTime> {
        (**self).warmup_end_time()
    }
}

fn validate_warmup(warmup_end: SimTime) -> SimResult<SimTime> {
    if !warmup_end.is_finite() || warmup_end.value() < 0.0 {
        return Err(SimError::out_of_range(
            "warm-up end time",
            format!("must be finite and non-negative, got {}", warmup_end.value()),
        ));
    }
    Ok(warmup_end)
}

// ── Unbounded ─────────────────────────────────────────────────────────

/// Runs until the future event list is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Unbounded {
    warmup_end: Option<SimTime>,
}

impl Unbounded {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply warm-up when the clock reaches `warmup_end`.
    pub fn with_warmup(mut self, warmup_end: SimTime) -> SimResult<Self> {
        self.warmup_end = Some(validate_warmup(warmup_end)?);
        Ok(self)
    }
}

impl<M: ?Sized> RunStrategy<M> for Unbounded {
    fn should_continue(&mut self, _status: &RunStatus, _model: &M) -> bool {
        true
    }

    fn warmup_end_time(&self) -> Option<SimTime> {
        self.warmup_end
    }
}

// ── Duration-bound ────────────────────────────────────────────────────

/// Continues while the clock is before `end_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationBound {
    end_time: SimTime,
    warmup_end: Option<SimTime>,
}

impl DurationBound {
    /// Fails with out-of-range if `end_time` is NaN.
    pub fn new(end_time: SimTime) -> SimResult<Self> {
        if end_time.value().is_nan() {
            return Err(SimError::out_of_range("end time", "must not be NaN"));
        }
        Ok(DurationBound {
            end_time,
            warmup_end: None,
        })
    }

    /// Apply warm-up when the clock reaches `warmup_end`.
    pub fn with_warmup(mut self, warmup_end: SimTime) -> SimResult<Self> {
        self.warmup_end = Some(validate_warmup(warmup_end)?);
        Ok(self)
    }

    pub fn end_time(&self) -> SimTime {
        self.end_time
    }
}

impl<M: ?Sized> RunStrategy<M> for DurationBound {
    fn should_continue(&mut self, status: &RunStatus, _model: &M) -> bool {
        let go_on = status.clock_time < self.end_time;
        if !go_on {
            debug!(clock = %status.clock_time, end = %self.end_time, "Duration bound reached");
        }
        go_on
    }

    fn warmup_end_time(&self) -> Option<SimTime> {
        self.warmup_end
    }
}

// ── Event-count-bound ─────────────────────────────────────────────────

/// Continues while fewer than `max_events` events have executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventCountBound {
    max_events: u64,
    warmup_end: Option<SimTime>,
}

impl EventCountBound {
    /// Fails with out-of-range if `max_events` is zero.
    pub fn new(max_events: u64) -> SimResult<Self> {
        if max_events == 0 {
            return Err(SimError::out_of_range(
                "max event count",
                "must be positive, got 0",
            ));
        }
        Ok(EventCountBound {
            max_events,
            warmup_end: None,
        })
    }

    /// Apply warm-up when the clock reaches `warmup_end`.
    pub fn with_warmup(mut self, warmup_end: SimTime) -> SimResult<Self> {
        self.warmup_end = Some(validate_warmup(warmup_end)?);
        Ok(self)
    }

    pub fn max_events(&self) -> u64 {
        self.max_events
    }
}

impl<M: ?Sized> RunStrategy<M> for EventCountBound {
    fn should_continue(&mut self, status: &RunStatus, _model: &M) -> bool {
        let go_on = status.executed_event_count < self.max_events;
        if !go_on {
            debug!(executed = status.executed_event_count, "Event count bound reached");
        }
        go_on
    }

    fn warmup_end_time(&self) -> Option<SimTime> {
        self.warmup_end
    }
}

// ── Conditional ───────────────────────────────────────────────────────

/// Continues while an injected predicate over the run status and the
/// root model holds.
pub struct Conditional<F> {
    predicate: F,
    warmup_end: Option<SimTime>,
}

impl<F> Conditional<F> {
    pub fn new(predicate: F) -> Self {
        Conditional {
            predicate,
            warmup_end: None,
        }
    }

    /// Apply warm-up when the clock reaches `warmup_end`.
    pub fn with_warmup(mut self, warmup_end: SimTime) -> SimResult<Self> {
        self.warmup_end = Some(validate_warmup(warmup_end)?);
        Ok(self)
    }
}

impl<M: ?Sized, F> RunStrategy<M> for Conditional<F>
where
    F: FnMut(&RunStatus, &M) -> bool,
{
    fn should_continue(&mut self, status: &RunStatus, model: &M) -> bool {
        (self.predicate)(status, model)
    }

    fn warmup_end_time(&self) -> Option<SimTime> {
        self.warmup_end
    }
}

impl<F> std::fmt::Debug for Conditional<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conditional")
            .field("warmup_end", &self.warmup_end)
            .finish_non_exhaustive()
    }
}

// ── Configuration ─────────────────────────────────────────────────────

/// Plain-data run configuration.
///
/// Conditional strategies carry a closure and are built in code instead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RunConfig {
    /// Run until the future event list is exhausted.
    Unbounded { warmup_end_time: Option<f64> },
    /// Run while the clock is before `end_time`.
    Duration {
        end_time: f64,
        warmup_end_time: Option<f64>,
    },
    /// Run until `max_events` events have executed.
    EventCount {
        max_events: u64,
        warmup_end_time: Option<f64>,
    },
}

impl RunConfig {
    pub fn warmup_end_time(&self) -> Option<f64> {
        match *self {
            RunConfig::Unbounded { warmup_end_time }
            | RunConfig::Duration { warmup_end_time, .. }
            | RunConfig::EventCount { warmup_end_time, .. } => warmup_end_time,
        }
    }

    /// Validate the configuration and build the strategy it describes.
    pub fn into_strategy<M: ?Sized + 'static>(self) -> SimResult<Box<dyn RunStrategy<M>>> {
        let warmup = self.warmup_end_time().map(SimTime::new);
        Ok(match self {
            RunConfig::Unbounded { .. } => {
                let mut s = Unbounded::new();
                if let Some(w) = warmup {
                    s = s.with_warmup(w)?;
                }
                Box::new(s)
            }
            RunConfig::Duration { end_time, .. } => {
                let mut s = DurationBound::new(SimTime::new(end_time))?;
                if let Some(w) = warmup {
                    s = s.with_warmup(w)?;
                }
                Box::new(s)
            }
            RunConfig::EventCount { max_events, .. } => {
                let mut s = EventCountBound::new(max_events)?;
                if let Some(w) = warmup {
                    s = s.with_warmup(w)?;
                }
                Box::new(s)
            }
        })
    }
}
