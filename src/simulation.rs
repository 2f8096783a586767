/// Simulation engine and the run context handed to models.
///
/// Drives the future event list: asks the run strategy whether to go on,
/// pops the earliest event, advances the clock, applies the one-shot
/// warm-up transition and dispatches to the root model. The loop is
/// purely synchronous and single-threaded.

use tracing::{debug, info, trace};

use crate::component::ComponentId;
use crate::error::{SimError, SimResult};
use crate::event::EventId;
use crate::model::Model;
use crate::scheduler::{FutureEventList, Scheduler};
use crate::strategy::RunStrategy;
use crate::time::SimTime;
use crate::trace::ExecutionTrace;

// ── Run status ────────────────────────────────────────────────────────

/// A copyable snapshot of the engine counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStatus {
    /// Current simulation clock.
    pub clock_time: SimTime,
    /// Events executed so far (excluding one in progress).
    pub executed_event_count: u64,
    /// Events waiting in the future event list.
    pub pending_event_count: usize,
}

// ── Run Context ───────────────────────────────────────────────────────

/// View handed to the model on `initialize` and on every event.
///
/// Exposes the clock and executed-event count read-only and the
/// [`Scheduler`] capability. The context borrows the future event list
/// mutably, so a handler can add events but never pop or run them.
pub struct RunContext<'a, P> {
    pub(crate) fel: &'a mut FutureEventList<P>,
    pub(crate) clock: SimTime,
    pub(crate) executed: u64,
}

impl<'a, P> RunContext<'a, P> {
    pub(crate) fn new(fel: &'a mut FutureEventList<P>, clock: SimTime, executed: u64) -> Self {
        RunContext {
            fel,
            clock,
            executed,
        }
    }

    /// Current simulation clock.
    #[inline]
    pub fn clock_time(&self) -> SimTime {
        self.clock
    }

    /// Number of events executed before the current one.
    #[inline]
    pub fn executed_event_count(&self) -> u64 {
        self.executed
    }

    /// Number of pending events.
    pub fn pending_event_count(&self) -> usize {
        self.fel.len()
    }

    /// Snapshot of the counters.
    pub fn status(&self) -> RunStatus {
        RunStatus {
            clock_time: self.clock,
            executed_event_count: self.executed,
            pending_event_count: self.fel.len(),
        }
    }
}

impl<P> Scheduler<P> for RunContext<'_, P> {
    fn clock_time(&self) -> SimTime {
        self.clock
    }

    fn schedule(&mut self, owner: Option<ComponentId>, at: SimTime, payload: P) -> SimResult<EventId> {
        self.fel.insert(self.clock, owner, at, payload)
    }
}

// ── Engine state ──────────────────────────────────────────────────────

/// Why the main loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The run strategy returned `false`.
    StrategyHalted,
    /// The future event list ran dry.
    Exhausted,
    /// A handler returned an error.
    Faulted,
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Running,
    Stopped(StopReason),
}

/// Result of a single [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// One event was executed.
    Executed { id: EventId, time: SimTime },
    /// The engine is stopped; nothing was executed.
    Stopped(StopReason),
}

/// Summary returned by [`Simulation::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub stop_reason: StopReason,
    pub clock_time: SimTime,
    pub executed_event_count: u64,
    /// Clock value at which warm-up was applied, if it was.
    pub warmed_up_at: Option<SimTime>,
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level simulation driver.
///
/// Owns the clock, the future event list, the root model and the run
/// strategy. Call [`run`](Self::run) to execute until the strategy says
/// stop or the list is exhausted, or [`step`](Self::step) to advance by
/// exactly one event.
pub struct Simulation<M: Model> {
    fel: FutureEventList<M::Event>,
    clock: SimTime,
    executed: u64,
    model: M,
    strategy: Box<dyn RunStrategy<M>>,
    state: EngineState,
    warmed_up_at: Option<SimTime>,
    trace: Option<ExecutionTrace>,
}

impl<M: Model> Simulation<M> {
    /// Create an engine at time zero around `model`.
    pub fn new<S>(model: M, strategy: S) -> Self
    where
        S: RunStrategy<M> + 'static,
    {
        Simulation {
            fel: FutureEventList::new(),
            clock: SimTime::ZERO,
            executed: 0,
            model,
            strategy: Box::new(strategy),
            state: EngineState::NotStarted,
            warmed_up_at: None,
            trace: None,
        }
    }

    /// Record every executed event into an [`ExecutionTrace`].
    pub fn enable_trace(&mut self) {
        if self.trace.is_none() {
            self.trace = Some(ExecutionTrace::new());
        }
    }

    /// The execution trace, if tracing is enabled.
    pub fn trace(&self) -> Option<&ExecutionTrace> {
        self.trace.as_ref()
    }

    /// The root model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Consume the engine and return the root model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Current simulation clock.
    pub fn clock_time(&self) -> SimTime {
        self.clock
    }

    /// Total events executed so far.
    pub fn executed_event_count(&self) -> u64 {
        self.executed
    }

    /// Number of events waiting in the future event list.
    pub fn pending_event_count(&self) -> usize {
        self.fel.len()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Clock value at which warm-up was applied, if it has been.
    pub fn warmed_up_at(&self) -> Option<SimTime> {
        self.warmed_up_at
    }

    /// Snapshot of the counters.
    pub fn status(&self) -> RunStatus {
        RunStatus {
            clock_time: self.clock,
            executed_event_count: self.executed,
            pending_event_count: self.fel.len(),
        }
    }

    /// Run the model's `initialize` hook and enter the `Running` state.
    ///
    /// Called implicitly by the first `step`/`run`. Fails if the engine
    /// has already been initialized.
    pub fn initialize(&mut self) -> SimResult<()> {
        if self.state != EngineState::NotStarted {
            return Err(SimError::InvalidOperation(
                "simulation is already initialized".into(),
            ));
        }
        self.state = EngineState::Running;
        info!(
            clock = %self.clock,
            warmup_end = ?self.strategy.warmup_end_time().map(SimTime::value),
            "Initializing simulation"
        );
        let mut ctx = RunContext::new(&mut self.fel, self.clock, self.executed);
        if let Err(e) = self.model.initialize(&mut ctx) {
            self.state = EngineState::Stopped(StopReason::Faulted);
            return Err(e);
        }
        debug!(pending = self.fel.len(), "Model initialized");
        Ok(())
    }

    /// Execute a single loop iteration.
    ///
    /// Returns `StepOutcome::Stopped` once the strategy halts or the
    /// future event list is empty; further calls keep returning it.
    pub fn step(&mut self) -> SimResult<StepOutcome> {
        match self.state {
            EngineState::NotStarted => self.initialize()?,
            EngineState::Stopped(reason) => return Ok(StepOutcome::Stopped(reason)),
            EngineState::Running => {}
        }

        let status = self.status();
        if !self.strategy.should_continue(&status, &self.model) {
            return Ok(self.stop(StopReason::StrategyHalted));
        }

        let Some(event) = self.fel.pop_next() else {
            return Ok(self.stop(StopReason::Exhausted));
        };

        // The future event list rejects past times, so the clock never
        // moves backward.
        debug_assert!(
            event.scheduled_at >= self.clock,
            "Time went backward! current={}, event={}",
            self.clock,
            event.scheduled_at
        );
        self.clock = event.scheduled_at;

        if self.warmed_up_at.is_none() {
            if let Some(warmup_end) = self.strategy.warmup_end_time() {
                if self.clock >= warmup_end {
                    info!(clock = %self.clock, "Warm-up period over, resetting statistics");
                    self.model.warmed_up(self.clock);
                    self.warmed_up_at = Some(self.clock);
                    if let Some(trace) = self.trace.as_mut() {
                        trace.mark_warmed_up(self.executed, self.clock);
                    }
                }
            }
        }

        let (id, time, owner) = (event.id, event.scheduled_at, event.owner);
        trace!(event = %id, clock = %time, owner = ?owner, "Executing event");
        if let Some(trace) = self.trace.as_mut() {
            trace.record(self.executed, id, time, owner);
        }

        let mut ctx = RunContext::new(&mut self.fel, self.clock, self.executed);
        if let Err(e) = self.model.execute(&mut ctx, event) {
            self.state = EngineState::Stopped(StopReason::Faulted);
            return Err(e);
        }
        self.executed += 1;

        Ok(StepOutcome::Executed { id, time })
    }

    /// Run the main loop until it stops.
    pub fn run(&mut self) -> SimResult<RunReport> {
        loop {
            if let StepOutcome::Stopped(stop_reason) = self.step()? {
                return Ok(RunReport {
                    stop_reason,
                    clock_time: self.clock,
                    executed_event_count: self.executed,
                    warmed_up_at: self.warmed_up_at,
                });
            }
        }
    }

    fn stop(&mut self, reason: StopReason) -> StepOutcome {
        info!(
            reason = ?reason,
            clock = %self.clock,
            executed = self.executed,
            pending = self.fel.len(),
            "Simulation stopped"
        );
        self.state = EngineState::Stopped(reason);
        StepOutcome::Stopped(reason)
    }
}

/// Seeding events from outside the model before (or between) steps.
impl<M: Model> Scheduler<M::Event> for Simulation<M> {
    fn clock_time(&self) -> SimTime {
        self.clock
    }

    fn schedule(
        &mut self,
        owner: Option<ComponentId>,
        at: SimTime,
        payload: M::Event,
    ) -> SimResult<EventId> {
        if let EngineState::Stopped(reason) = self.state {
            return Err(SimError::InvalidOperation(format!(
                "cannot schedule on a stopped simulation ({:?})",
                reason
            )));
        }
        self.fel.insert(self.clock, owner, at, payload)
    }
}

impl<M: Model + std::fmt::Debug> std::fmt::Debug for Simulation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("clock", &self.clock)
            .field("executed", &self.executed)
            .field("pending", &self.fel.len())
            .field("state", &self.state)
            .field("warmed_up_at", &self.warmed_up_at)
            .field("model", &self.model)
            .finish()
    }
}
