/// Execution trace for replay verification.
///
/// Records every executed event into an append-only trace and folds it
/// into a deterministic digest. Two runs with the same seeds and
/// configuration produce identical traces; comparing digests is the
/// cheap way to detect a determinism violation.

use crate::component::ComponentId;
use crate::event::EventId;
use crate::time::SimTime;

// ── Hash utility ──────────────────────────────────────────────────────

/// Combine two u64 hashes deterministically.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    let mut h = a;
    h = h.wrapping_mul(0x517cc1b727220a95);
    h = h.wrapping_add(b);
    h ^= h >> 32;
    h
}

// ── Trace entry ───────────────────────────────────────────────────────

/// A record of a single executed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    /// Position in execution order (equals the executed count before it ran).
    pub index: u64,
    /// The future event list's sequence number for this event.
    pub event_id: EventId,
    /// Clock value at which it executed.
    pub time: SimTime,
    /// The component that scheduled it.
    pub owner: Option<ComponentId>,
}

impl TraceEntry {
    fn hash(&self) -> u64 {
        let mut h = hash_combine(self.index, self.event_id.raw());
        h = hash_combine(h, self.time.value().to_bits());
        hash_combine(h, self.owner.map_or(0, |o| o.raw().wrapping_add(1)))
    }
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[#{} {} {}]", self.index, self.time, self.event_id)?;
        if let Some(owner) = self.owner {
            write!(f, " {}", owner)?;
        }
        Ok(())
    }
}

// ── Execution trace ───────────────────────────────────────────────────

/// Append-only trace of executed events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionTrace {
    entries: Vec<TraceEntry>,
    /// `(executed count, clock)` at the moment warm-up was applied.
    warmed_up: Option<(u64, SimTime)>,
}

impl ExecutionTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an executed event.
    pub fn record(
        &mut self,
        index: u64,
        event_id: EventId,
        time: SimTime,
        owner: Option<ComponentId>,
    ) {
        self.entries.push(TraceEntry {
            index,
            event_id,
            time,
            owner,
        });
    }

    /// Note that warm-up was applied before event `index`.
    pub fn mark_warmed_up(&mut self, index: u64, time: SimTime) {
        self.warmed_up = Some((index, time));
    }

    /// All entries in execution order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// `(executed count, clock)` at which warm-up was applied.
    pub fn warmed_up(&self) -> Option<(u64, SimTime)> {
        self.warmed_up
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deterministic digest over all entries and the warm-up marker.
    pub fn digest(&self) -> u64 {
        let mut h = hash_combine(0, self.entries.len() as u64);
        for entry in &self.entries {
            h = hash_combine(h, entry.hash());
        }
        if let Some((index, time)) = self.warmed_up {
            h = hash_combine(h, index);
            h = hash_combine(h, time.value().to_bits());
        }
        h
    }
}
