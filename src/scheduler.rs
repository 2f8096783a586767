/// Future event list and the scheduling capability handed to models.
///
/// The list is a `BinaryHeap` with reversed `Ord` on `Event` acting as a
/// min-heap keyed by `(scheduled_at, event_id)`. Event IDs are assigned
/// in call order, so simultaneous events pop in the order they were
/// scheduled no matter which component scheduled them.

use std::collections::BinaryHeap;

use crate::component::ComponentId;
use crate::error::{SimError, SimResult};
use crate::event::{Event, EventId, EventIdGen};
use crate::time::SimTime;

// ── Scheduler capability ──────────────────────────────────────────────

/// The narrow scheduling interface exposed to models and components.
///
/// Implemented by the engine (for seeding before a run) and by
/// [`RunContext`](crate::simulation::RunContext) (for handlers).
pub trait Scheduler<P> {
    /// Current clock of the scheduling side.
    fn clock_time(&self) -> SimTime;

    /// Schedule `payload` at absolute time `at`.
    ///
    /// Fails with [`SimError::NonCausalEvent`] if `at` is before the clock
    /// and with an out-of-range error if `at` is not finite. The future
    /// event list is left untouched on failure.
    fn schedule(&mut self, owner: Option<ComponentId>, at: SimTime, payload: P) -> SimResult<EventId>;

    /// Schedule `payload` `delay` time units after the current clock.
    fn schedule_after(
        &mut self,
        owner: Option<ComponentId>,
        delay: f64,
        payload: P,
    ) -> SimResult<EventId> {
        let at = self.clock_time().plus(delay);
        self.schedule(owner, at, payload)
    }
}

// ── Future Event List ─────────────────────────────────────────────────

/// Pending events in `(time, sequence)` order.
///
/// Owns the ID generator, so sequence numbers are per engine instance.
/// Entries can only be inserted and popped: there is no cancel or
/// reschedule, handlers detect stale events by their own liveness flags.
#[derive(Debug, Clone)]
pub struct FutureEventList<P> {
    /// Min-heap (via reversed Ord on Event).
    queue: BinaryHeap<Event<P>>,

    /// Monotonic event-ID generator.
    id_gen: EventIdGen,
}

impl<P> FutureEventList<P> {
    /// Create a new, empty list.
    pub fn new() -> Self {
        FutureEventList {
            queue: BinaryHeap::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Insert an event at `at` relative to clock `now`.
    ///
    /// Returns the `EventId` assigned to the event. A sequence number is
    /// only consumed when the insertion succeeds.
    pub fn insert(
        &mut self,
        now: SimTime,
        owner: Option<ComponentId>,
        at: SimTime,
        payload: P,
    ) -> SimResult<EventId> {
        if !at.is_finite() {
            return Err(SimError::out_of_range(
                "event time",
                format!("{} is not a finite time", at.value()),
            ));
        }
        if at.is_before(now) {
            return Err(SimError::NonCausalEvent {
                requested: at,
                current: now,
            });
        }
        let id = self.id_gen.next_id();
        self.queue.push(Event::new(id, at, owner, payload));
        Ok(id)
    }

    /// Pop the next event (earliest time, lowest ID).
    ///
    /// Returns `None` when the list is empty.
    pub fn pop_next(&mut self) -> Option<Event<P>> {
        self.queue.pop()
    }

    /// Peek at the next event without removing it.
    pub fn peek_next(&self) -> Option<&Event<P>> {
        self.queue.peek()
    }

    /// Returns `true` if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns the next event ID that will be assigned.
    pub fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }
}

impl<P> Default for FutureEventList<P> {
    fn default() -> Self {
        Self::new()
    }
}
