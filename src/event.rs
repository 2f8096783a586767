/// Event envelope for the simulation kernel.
///
/// Every effect in a run is modeled as an `Event`. Events are single-use
/// records owned by the future event list until popped, then executed
/// once and discarded.

use crate::component::ComponentId;
use crate::time::SimTime;
use std::cmp::Ordering;

// ── Event ID ──────────────────────────────────────────────────────────

/// A strictly-increasing insertion sequence number.
///
/// Breaks ties in the future event list: two events scheduled at the
/// same `SimTime` are ordered by their `EventId`, which corresponds to
/// scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    /// Wrap a raw u64 into an `EventId`.
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// Return the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Deterministic, strictly-increasing event-ID generator.
///
/// Each engine owns exactly one of these (inside its future event list),
/// so sequence numbers never leak between runs.
#[derive(Debug, Clone)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    /// Create a generator starting at 0.
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

impl Default for EventIdGen {
    fn default() -> Self {
        Self::new()
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A scheduled event carrying a model-defined payload `P`.
///
/// The future event list orders events by `(scheduled_at, id)`.
#[derive(Debug, Clone)]
pub struct Event<P> {
    /// Insertion sequence number.
    pub id: EventId,

    /// Absolute time at which this event executes.
    pub scheduled_at: SimTime,

    /// The component that scheduled the event, if any.
    pub owner: Option<ComponentId>,

    /// What the event does.
    pub payload: P,
}

impl<P> Event<P> {
    /// Convenience constructor.
    pub fn new(id: EventId, scheduled_at: SimTime, owner: Option<ComponentId>, payload: P) -> Self {
        Event {
            id,
            scheduled_at,
            owner,
            payload,
        }
    }

    /// The `(time, sequence)` key this event is ordered by.
    #[inline]
    pub fn key(&self) -> (SimTime, EventId) {
        (self.scheduled_at, self.id)
    }
}

impl<P> PartialEq for Event<P> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<P> Eq for Event<P> {}

/// Ordering: smallest `(scheduled_at, id)` first.
///
/// `BinaryHeap` is a max-heap, so the natural ordering is reversed here.
impl<P> Ord for Event<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .scheduled_at
            .cmp(&self.scheduled_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl<P> PartialOrd for Event<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
