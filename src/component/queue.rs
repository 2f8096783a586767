//! `Queue`: a bounded or unbounded FIFO waiting line.

use std::collections::VecDeque;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::event::EventId;
use crate::scheduler::Scheduler;
use crate::simulation::RunContext;
use crate::stats::OccupancyCounter;
use crate::time::SimTime;

use super::event::{ensure_owner, QueueEvent, QueueEventKind};
use super::id::ComponentId;
use super::notice::{Observers, QueueNotice};

/// FIFO waiting line with optional capacity.
///
/// Loads enter through [`try_schedule_enqueue`](Self::try_schedule_enqueue),
/// which either schedules an `Enqueue` at the current clock or balks.
/// Enqueues already scheduled but not yet executed count against the
/// capacity, so any number of requests at the same instant can never
/// overfill the line.
pub struct Queue<L> {
    id: ComponentId,
    /// `None` means unbounded.
    capacity: Option<usize>,
    waiting: VecDeque<L>,
    pending_enqueues: usize,
    to_dequeue: bool,
    initialized: bool,
    occupancy: OccupancyCounter,
    observers: Observers<QueueNotice<L>>,
}

/// Builder for [`Queue`].
#[derive(Debug, Clone)]
pub struct QueueBuilder<L> {
    id: ComponentId,
    capacity: Option<usize>,
    to_dequeue: bool,
    _load: PhantomData<fn() -> L>,
}

impl<L> QueueBuilder<L> {
    /// Bound the queue to `capacity` waiting loads.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Remove any bound (the default).
    pub fn unbounded(mut self) -> Self {
        self.capacity = None;
        self
    }

    /// Initial dequeue flag (default `true`).
    pub fn to_dequeue(mut self, enabled: bool) -> Self {
        self.to_dequeue = enabled;
        self
    }

    pub fn build(self) -> SimResult<Queue<L>> {
        if self.capacity == Some(0) {
            return Err(SimError::out_of_range(
                "queue capacity",
                format!("queue {} needs a capacity of at least 1", self.id),
            ));
        }
        Ok(Queue {
            id: self.id,
            capacity: self.capacity,
            waiting: VecDeque::new(),
            pending_enqueues: 0,
            to_dequeue: self.to_dequeue,
            initialized: false,
            occupancy: OccupancyCounter::new(SimTime::ZERO),
            observers: Observers::new(),
        })
    }
}

impl<L> Queue<L> {
    pub fn builder(id: ComponentId) -> QueueBuilder<L> {
        QueueBuilder {
            id,
            capacity: None,
            to_dequeue: true,
            _load: PhantomData,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// `None` for an unbounded queue.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Loads currently waiting.
    pub fn occupancy(&self) -> usize {
        self.waiting.len()
    }

    /// Free slots; `None` for an unbounded queue.
    pub fn vacancy(&self) -> Option<usize> {
        self.capacity.map(|c| c.saturating_sub(self.waiting.len()))
    }

    /// Waiting loads, head first.
    pub fn waiting(&self) -> impl Iterator<Item = &L> {
        self.waiting.iter()
    }

    /// Enqueues scheduled but not yet executed.
    pub fn pending_enqueue_count(&self) -> usize {
        self.pending_enqueues
    }

    pub fn to_dequeue(&self) -> bool {
        self.to_dequeue
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn occupancy_counter(&self) -> &OccupancyCounter {
        &self.occupancy
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&QueueNotice<L>) + 'static) {
        self.observers.subscribe(listener);
    }

    /// Lifecycle hook: starts the occupancy series at the current clock.
    pub fn initialize<P>(&mut self, ctx: &mut RunContext<'_, P>) -> SimResult<()> {
        if self.initialized {
            return Err(SimError::InvalidOperation(format!(
                "queue {} is already initialized",
                self.id
            )));
        }
        self.initialized = true;
        self.occupancy = OccupancyCounter::new(ctx.clock_time());
        Ok(())
    }

    /// Request that `load` join the tail of the line.
    ///
    /// Schedules an `Enqueue` at the current clock and returns `true`, or
    /// raises [`QueueNotice::LoadBalked`] and returns `false` when the
    /// queue is full.
    pub fn try_schedule_enqueue<P>(&mut self, load: L, ctx: &mut RunContext<'_, P>) -> SimResult<bool>
    where
        P: From<QueueEvent<L>>,
    {
        self.ensure_initialized()?;
        let now = ctx.clock_time();
        if self.is_full() {
            debug!(queue = %self.id, clock = %now, "Load balked");
            let notice = QueueNotice::LoadBalked { load, time: now };
            self.observers.notify(&notice);
            return Ok(false);
        }
        self.schedule_kind(ctx, QueueEventKind::Enqueue(load))?;
        self.pending_enqueues += 1;
        Ok(true)
    }

    /// Schedule a `Dequeue` at the current clock if dequeuing is enabled
    /// and a load is waiting. Returns whether an event was scheduled.
    pub fn trigger_dequeue_attempt<P>(&self, ctx: &mut RunContext<'_, P>) -> SimResult<bool>
    where
        P: From<QueueEvent<L>>,
    {
        self.ensure_initialized()?;
        if !self.to_dequeue || self.waiting.is_empty() {
            return Ok(false);
        }
        self.schedule_kind(ctx, QueueEventKind::Dequeue)?;
        Ok(true)
    }

    /// Schedule a change of the dequeue flag at the current clock.
    pub fn schedule_update_to_dequeue<P>(
        &self,
        to_dequeue: bool,
        ctx: &mut RunContext<'_, P>,
    ) -> SimResult<EventId>
    where
        P: From<QueueEvent<L>>,
    {
        self.ensure_initialized()?;
        self.schedule_kind(ctx, QueueEventKind::UpdateToDequeue(to_dequeue))
    }

    /// Apply one of this queue's events and return the notices raised.
    pub fn execute<P>(
        &mut self,
        ctx: &mut RunContext<'_, P>,
        event: QueueEvent<L>,
    ) -> SimResult<Vec<QueueNotice<L>>>
    where
        L: Clone,
    {
        ensure_owner(self.id, event.owner())?;
        self.ensure_initialized()?;
        let now = ctx.clock_time();

        match event.into_kind() {
            QueueEventKind::Enqueue(load) => {
                if self.pending_enqueues == 0 {
                    return Err(SimError::InvalidOperation(format!(
                        "queue {} has no pending enqueue at {}",
                        self.id, now
                    )));
                }
                if self.capacity.is_some_and(|cap| self.waiting.len() >= cap) {
                    return Err(SimError::InvalidOperation(format!(
                        "queue {} is full at {}, enqueue would exceed capacity",
                        self.id, now
                    )));
                }
                self.pending_enqueues -= 1;
                self.waiting.push_back(load.clone());
                self.occupancy.observe_count(self.waiting.len(), now);
                trace!(queue = %self.id, clock = %now, occupancy = self.waiting.len(), "Load enqueued");

                let notice = QueueNotice::LoadEnqueued { load, time: now };
                self.observers.notify(&notice);
                Ok(vec![notice])
            }

            QueueEventKind::Dequeue => {
                if !self.to_dequeue {
                    return Ok(Vec::new());
                }
                let Some(load) = self.waiting.pop_front() else {
                    return Ok(Vec::new());
                };
                self.occupancy.observe_count(self.waiting.len(), now);
                trace!(queue = %self.id, clock = %now, occupancy = self.waiting.len(), "Load dequeued");

                let notice = QueueNotice::LoadDequeued { load, time: now };
                self.observers.notify(&notice);
                Ok(vec![notice])
            }

            QueueEventKind::UpdateToDequeue(enabled) => {
                if self.to_dequeue != enabled {
                    debug!(queue = %self.id, clock = %now, to_dequeue = enabled, "Dequeue flag changed");
                }
                self.to_dequeue = enabled;
                Ok(Vec::new())
            }
        }
    }

    /// Lifecycle hook: restart the occupancy series at `time`.
    pub fn warmed_up(&mut self, time: SimTime) {
        self.occupancy.warmed_up(time);
    }

    fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.waiting.len() + self.pending_enqueues >= cap,
            None => false,
        }
    }

    fn ensure_initialized(&self) -> SimResult<()> {
        if !self.initialized {
            return Err(SimError::not_initialized(format!("queue {}", self.id)));
        }
        Ok(())
    }

    fn schedule_kind<P>(&self, ctx: &mut RunContext<'_, P>, kind: QueueEventKind<L>) -> SimResult<EventId>
    where
        P: From<QueueEvent<L>>,
    {
        let now = ctx.clock_time();
        ctx.schedule(Some(self.id), now, QueueEvent::new(self.id, kind).into())
    }
}

impl<L: std::fmt::Debug> std::fmt::Debug for Queue<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("waiting", &self.waiting)
            .field("pending_enqueues", &self.pending_enqueues)
            .field("to_dequeue", &self.to_dequeue)
            .finish_non_exhaustive()
    }
}
