//! `Generator`: produces loads at sampled inter-arrival times.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::event::EventId;
use crate::scheduler::Scheduler;
use crate::simulation::RunContext;
use crate::time::SimTime;

use super::event::{ensure_owner, GeneratorEvent, GeneratorEventKind};
use super::id::ComponentId;
use super::notice::{GeneratorNotice, Observers};
use super::sampling::{InterArrivalSampler, LoadFactory};

/// Source of loads.
///
/// Two states, `Inactive` and `Active`, switched by its own `Start` and
/// `Stop` events. While active, each `Arrive` event builds a load, raises
/// [`GeneratorNotice::LoadGenerated`], counts it and then schedules the
/// next arrival.
///
/// Every `Start` opens a new activation epoch; `Arrive` events from an
/// earlier activation are ignored when they fire, so stopping and
/// restarting never leaves two arrival chains running.
pub struct Generator<L> {
    id: ComponentId,
    seed: u64,
    rng: ChaCha8Rng,
    inter_arrival: InterArrivalSampler,
    load_factory: LoadFactory<L>,
    skip_first: bool,
    start_at: Option<SimTime>,
    initialized: bool,
    is_active: bool,
    epoch: u64,
    start_time: Option<SimTime>,
    loads_generated: u64,
    observers: Observers<GeneratorNotice<L>>,
}

/// Builder for [`Generator`].
pub struct GeneratorBuilder<L> {
    id: ComponentId,
    seed: u64,
    inter_arrival: Option<InterArrivalSampler>,
    load_factory: Option<LoadFactory<L>>,
    skip_first: bool,
    start_at: Option<SimTime>,
}

impl<L> GeneratorBuilder<L> {
    /// Sampler for the delay between consecutive loads. Required.
    pub fn inter_arrival(mut self, sampler: impl FnMut(&mut ChaCha8Rng) -> f64 + 'static) -> Self {
        self.inter_arrival = Some(Box::new(sampler));
        self
    }

    /// Factory building each load. Required.
    pub fn load_factory(mut self, factory: impl FnMut(&mut ChaCha8Rng) -> L + 'static) -> Self {
        self.load_factory = Some(Box::new(factory));
        self
    }

    /// Delay the first arrival by one inter-arrival sample after `Start`.
    pub fn skip_first(mut self, skip: bool) -> Self {
        self.skip_first = skip;
        self
    }

    /// Time of the `Start` scheduled by `initialize` (default `0`);
    /// `None` leaves starting to explicit `schedule_start` calls.
    pub fn start_at(mut self, at: Option<SimTime>) -> Self {
        self.start_at = at;
        self
    }

    pub fn build(self) -> SimResult<Generator<L>> {
        let inter_arrival = self.inter_arrival.ok_or_else(|| {
            SimError::InvalidArgument(format!("generator {} needs an inter-arrival sampler", self.id))
        })?;
        let load_factory = self.load_factory.ok_or_else(|| {
            SimError::InvalidArgument(format!("generator {} needs a load factory", self.id))
        })?;
        Ok(Generator {
            id: self.id,
            seed: self.seed,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            inter_arrival,
            load_factory,
            skip_first: self.skip_first,
            start_at: self.start_at,
            initialized: false,
            is_active: false,
            epoch: 0,
            start_time: None,
            loads_generated: 0,
            observers: Observers::new(),
        })
    }
}

impl<L> Generator<L> {
    /// Start building a generator whose random stream is seeded with `seed`.
    pub fn builder(id: ComponentId, seed: u64) -> GeneratorBuilder<L> {
        GeneratorBuilder {
            id,
            seed,
            inter_arrival: None,
            load_factory: None,
            skip_first: false,
            start_at: Some(SimTime::ZERO),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_skipping_first(&self) -> bool {
        self.skip_first
    }

    /// When the current activation (or statistics window) began.
    pub fn start_time(&self) -> Option<SimTime> {
        self.start_time
    }

    /// Loads generated since the last start or warm-up.
    pub fn loads_generated_count(&self) -> u64 {
        self.loads_generated
    }

    /// Register a listener for [`GeneratorNotice`]s.
    pub fn subscribe(&mut self, listener: impl FnMut(&GeneratorNotice<L>) + 'static) {
        self.observers.subscribe(listener);
    }

    /// Lifecycle hook: schedules the configured `Start`, if any.
    pub fn initialize<P>(&mut self, ctx: &mut RunContext<'_, P>) -> SimResult<()>
    where
        P: From<GeneratorEvent>,
    {
        if self.initialized {
            return Err(SimError::InvalidOperation(format!(
                "generator {} is already initialized",
                self.id
            )));
        }
        self.initialized = true;
        if let Some(at) = self.start_at {
            self.schedule_kind(ctx, at, GeneratorEventKind::Start)?;
        }
        Ok(())
    }

    /// Schedule a `Start` at the current clock.
    pub fn schedule_start<P>(&self, ctx: &mut RunContext<'_, P>) -> SimResult<EventId>
    where
        P: From<GeneratorEvent>,
    {
        let now = ctx.clock_time();
        self.schedule_start_at(ctx, now)
    }

    /// Schedule a `Start` at `at`.
    pub fn schedule_start_at<P>(&self, ctx: &mut RunContext<'_, P>, at: SimTime) -> SimResult<EventId>
    where
        P: From<GeneratorEvent>,
    {
        self.ensure_initialized()?;
        self.schedule_kind(ctx, at, GeneratorEventKind::Start)
    }

    /// Schedule a `Stop` at the current clock.
    pub fn schedule_stop<P>(&self, ctx: &mut RunContext<'_, P>) -> SimResult<EventId>
    where
        P: From<GeneratorEvent>,
    {
        let now = ctx.clock_time();
        self.schedule_stop_at(ctx, now)
    }

    /// Schedule a `Stop` at `at`.
    pub fn schedule_stop_at<P>(&self, ctx: &mut RunContext<'_, P>, at: SimTime) -> SimResult<EventId>
    where
        P: From<GeneratorEvent>,
    {
        self.ensure_initialized()?;
        self.schedule_kind(ctx, at, GeneratorEventKind::Stop)
    }

    /// Apply one of this generator's events.
    ///
    /// Returns the notices raised, after they have been delivered to the
    /// subscribed observers.
    pub fn execute<P>(
        &mut self,
        ctx: &mut RunContext<'_, P>,
        event: GeneratorEvent,
    ) -> SimResult<Vec<GeneratorNotice<L>>>
    where
        P: From<GeneratorEvent>,
    {
        self.execute_with(ctx, event, |_, _| Ok(()))
    }

    /// Like [`execute`](Self::execute), but hands each notice to `route`
    /// before the next arrival is scheduled.
    ///
    /// Anything `route` schedules at the current clock therefore runs
    /// ahead of a zero-delay next arrival.
    pub fn execute_with<P, F>(
        &mut self,
        ctx: &mut RunContext<'_, P>,
        event: GeneratorEvent,
        mut route: F,
    ) -> SimResult<Vec<GeneratorNotice<L>>>
    where
        P: From<GeneratorEvent>,
        F: FnMut(&mut RunContext<'_, P>, &GeneratorNotice<L>) -> SimResult<()>,
    {
        ensure_owner(self.id, event.owner())?;
        self.ensure_initialized()?;
        let now = ctx.clock_time();

        match *event.kind() {
            GeneratorEventKind::Start => {
                if self.is_active {
                    trace!(generator = %self.id, "Start ignored, already active");
                    return Ok(Vec::new());
                }
                let delay = if self.skip_first {
                    (self.inter_arrival)(&mut self.rng)
                } else {
                    0.0
                };
                let epoch = self.epoch + 1;
                self.schedule_kind(ctx, now.plus(delay), GeneratorEventKind::Arrive { epoch })?;
                self.epoch = epoch;
                self.is_active = true;
                self.start_time = Some(now);
                self.loads_generated = 0;
                debug!(generator = %self.id, clock = %now, epoch, "Generator started");
                Ok(Vec::new())
            }

            GeneratorEventKind::Arrive { epoch } => {
                if !self.is_active || epoch != self.epoch {
                    trace!(generator = %self.id, epoch, "Stale arrival ignored");
                    return Ok(Vec::new());
                }
                let load = (self.load_factory)(&mut self.rng);
                let notice = GeneratorNotice::LoadGenerated { load, time: now };
                self.observers.notify(&notice);
                route(ctx, &notice)?;

                self.loads_generated += 1;
                trace!(
                    generator = %self.id,
                    clock = %now,
                    count = self.loads_generated,
                    "Load generated"
                );
                let delay = (self.inter_arrival)(&mut self.rng);
                self.schedule_kind(ctx, now.plus(delay), GeneratorEventKind::Arrive { epoch })?;
                Ok(vec![notice])
            }

            GeneratorEventKind::Stop => {
                if self.is_active {
                    self.is_active = false;
                    debug!(generator = %self.id, clock = %now, "Generator stopped");
                }
                Ok(Vec::new())
            }
        }
    }

    /// Lifecycle hook: restart the statistics window at `time`.
    ///
    /// Leaves `is_active` and any pending arrival untouched.
    pub fn warmed_up(&mut self, time: SimTime) {
        self.start_time = Some(time);
        self.loads_generated = 0;
    }

    fn ensure_initialized(&self) -> SimResult<()> {
        if !self.initialized {
            return Err(SimError::not_initialized(format!("generator {}", self.id)));
        }
        Ok(())
    }

    fn schedule_kind<P>(
        &self,
        ctx: &mut RunContext<'_, P>,
        at: SimTime,
        kind: GeneratorEventKind,
    ) -> SimResult<EventId>
    where
        P: From<GeneratorEvent>,
    {
        ctx.schedule(Some(self.id), at, GeneratorEvent::new(self.id, kind).into())
    }
}

impl<L> std::fmt::Debug for Generator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("id", &self.id)
            .field("seed", &self.seed)
            .field("is_active", &self.is_active)
            .field("start_time", &self.start_time)
            .field("loads_generated", &self.loads_generated)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
