//! `Server`: serves up to `capacity` loads concurrently.

use std::hash::Hash;

use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::scheduler::Scheduler;
use crate::simulation::RunContext;
use crate::stats::OccupancyCounter;
use crate::time::SimTime;

use super::event::{ensure_owner, ServerEvent, ServerEventKind};
use super::id::ComponentId;
use super::notice::{Observers, ServerNotice};
use super::sampling::ServiceTimeSampler;

/// Bounded concurrent service station.
///
/// Loads in service are keyed by value, so `L` must be `Eq + Hash` and a
/// given load can be in service at most once. The map keeps insertion
/// order, which makes iteration (and therefore `warmed_up`) deterministic.
pub struct Server<L> {
    id: ComponentId,
    seed: u64,
    rng: ChaCha8Rng,
    capacity: usize,
    service_time: ServiceTimeSampler<L>,
    in_service: IndexMap<L, SimTime>,
    initialized: bool,
    busy: OccupancyCounter,
    observers: Observers<ServerNotice<L>>,
}

/// Builder for [`Server`].
pub struct ServerBuilder<L> {
    id: ComponentId,
    seed: u64,
    capacity: usize,
    service_time: Option<ServiceTimeSampler<L>>,
}

impl<L> ServerBuilder<L> {
    /// Maximum number of concurrent loads (default 1).
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Service time drawn per load.
    pub fn service_time(mut self, sampler: impl FnMut(&L, &mut ChaCha8Rng) -> f64 + 'static) -> Self {
        self.service_time = Some(Box::new(sampler));
        self
    }

    /// Service time independent of the load.
    pub fn service_time_sampler(mut self, mut sampler: impl FnMut(&mut ChaCha8Rng) -> f64 + 'static) -> Self {
        self.service_time = Some(Box::new(move |_load: &L, rng: &mut ChaCha8Rng| sampler(rng)));
        self
    }

    pub fn build(self) -> SimResult<Server<L>> {
        if self.capacity == 0 {
            return Err(SimError::out_of_range(
                "server capacity",
                format!("server {} needs a capacity of at least 1", self.id),
            ));
        }
        let service_time = self.service_time.ok_or_else(|| {
            SimError::InvalidArgument(format!("server {} needs a service time sampler", self.id))
        })?;
        Ok(Server {
            id: self.id,
            seed: self.seed,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            capacity: self.capacity,
            service_time,
            in_service: IndexMap::new(),
            initialized: false,
            busy: OccupancyCounter::new(SimTime::ZERO),
            observers: Observers::new(),
        })
    }
}

impl<L> Server<L>
where
    L: Clone + Eq + Hash,
{
    pub fn builder(id: ComponentId, seed: u64) -> ServerBuilder<L> {
        ServerBuilder {
            id,
            seed,
            capacity: 1,
            service_time: None,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Loads currently in service.
    pub fn occupancy(&self) -> usize {
        self.in_service.len()
    }

    pub fn vacancy(&self) -> usize {
        self.capacity - self.in_service.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Loads in service, in the order they started.
    pub fn loads_in_service(&self) -> impl Iterator<Item = &L> {
        self.in_service.keys()
    }

    /// Recorded start of service for `load`, if it is being served.
    pub fn service_start_time(&self, load: &L) -> Option<SimTime> {
        self.in_service.get(load).copied()
    }

    pub fn busy_counter(&self) -> &OccupancyCounter {
        &self.busy
    }

    /// Time-average fraction of capacity in use since the last warm-up.
    pub fn utilization(&self, now: SimTime) -> f64 {
        self.busy.average_count(now) / self.capacity as f64
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ServerNotice<L>) + 'static) {
        self.observers.subscribe(listener);
    }

    /// Lifecycle hook: starts the busy series at the current clock.
    pub fn initialize<P>(&mut self, ctx: &mut RunContext<'_, P>) -> SimResult<()> {
        if self.initialized {
            return Err(SimError::InvalidOperation(format!(
                "server {} is already initialized",
                self.id
            )));
        }
        self.initialized = true;
        self.busy = OccupancyCounter::new(ctx.clock_time());
        Ok(())
    }

    /// Begin serving `load` at the current clock.
    ///
    /// Returns `false` without touching any state when every slot is
    /// taken. On success records the start time, raises
    /// [`ServerNotice::StateChanged`] and schedules the completion.
    pub fn try_start_service<P>(&mut self, load: L, ctx: &mut RunContext<'_, P>) -> SimResult<bool>
    where
        P: From<ServerEvent<L>>,
    {
        if !self.initialized {
            return Err(SimError::not_initialized(format!("server {}", self.id)));
        }
        if self.in_service.len() >= self.capacity {
            trace!(server = %self.id, "Server full");
            return Ok(false);
        }
        if self.in_service.contains_key(&load) {
            return Err(SimError::InvalidArgument(format!(
                "load is already in service at server {}",
                self.id
            )));
        }

        let now = ctx.clock_time();
        let duration = (self.service_time)(&load, &mut self.rng);
        let complete = ServerEvent::new(self.id, ServerEventKind::ServiceComplete(load.clone()));
        ctx.schedule(Some(self.id), now.plus(duration), complete.into())?;

        self.in_service.insert(load, now);
        self.busy.observe_count(self.in_service.len(), now);
        debug!(
            server = %self.id,
            clock = %now,
            duration,
            in_service = self.in_service.len(),
            "Service started"
        );

        let notice = ServerNotice::StateChanged {
            time: now,
            in_service: self.in_service.len(),
        };
        self.observers.notify(&notice);
        Ok(true)
    }

    /// Apply one of this server's events and return the notices raised.
    pub fn execute<P>(
        &mut self,
        ctx: &mut RunContext<'_, P>,
        event: ServerEvent<L>,
    ) -> SimResult<Vec<ServerNotice<L>>> {
        ensure_owner(self.id, event.owner())?;
        if !self.initialized {
            return Err(SimError::not_initialized(format!("server {}", self.id)));
        }
        let now = ctx.clock_time();

        match event.into_kind() {
            ServerEventKind::ServiceComplete(load) => {
                let started_at = self.in_service.shift_remove(&load).ok_or_else(|| {
                    SimError::InvalidOperation(format!(
                        "completion for a load not in service at server {}",
                        self.id
                    ))
                })?;
                self.busy.observe_count(self.in_service.len(), now);
                debug!(
                    server = %self.id,
                    clock = %now,
                    in_service = self.in_service.len(),
                    "Service completed"
                );

                let changed = ServerNotice::StateChanged {
                    time: now,
                    in_service: self.in_service.len(),
                };
                self.observers.notify(&changed);
                let departed = ServerNotice::LoadDeparted {
                    load,
                    time: now,
                    started_at,
                };
                self.observers.notify(&departed);
                Ok(vec![changed, departed])
            }
        }
    }

    /// Lifecycle hook: every load in service is treated as having started
    /// at `time`.
    pub fn warmed_up(&mut self, time: SimTime) {
        for start in self.in_service.values_mut() {
            *start = time;
        }
        self.busy.warmed_up(time);
    }
}

impl<L: std::fmt::Debug> std::fmt::Debug for Server<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("id", &self.id)
            .field("seed", &self.seed)
            .field("capacity", &self.capacity)
            .field("in_service", &self.in_service)
            .finish_non_exhaustive()
    }
}
