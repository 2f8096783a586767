//! Component event payloads.
//!
//! Each component has a closed set of event kinds. The event values
//! themselves can only be built inside the crate by the component that
//! schedules them; a routing model receives them from the future event
//! list and hands them back through the component's `execute`, which is
//! the only path to the component's internal state transitions.
//!
//! None of the event types is `Clone`, so a popped event runs at most once:
//!
//! ```compile_fail
//! use kairos::component::GeneratorEvent;
//!
//! fn twice(event: GeneratorEvent) -> (GeneratorEvent, GeneratorEvent) {
//!     (event.clone(), event)
//! }
//! ```

use crate::error::{SimError, SimResult};

use super::id::ComponentId;

// ── Generator ─────────────────────────────────────────────────────────

/// What a generator event does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorEventKind {
    /// Activate the generator.
    Start,
    /// Produce one load; `epoch` identifies the activation that scheduled it.
    Arrive { epoch: u64 },
    /// Deactivate the generator.
    Stop,
}

/// An event addressed to a [`Generator`](super::Generator).
#[derive(Debug, PartialEq, Eq)]
pub struct GeneratorEvent {
    owner: ComponentId,
    kind: GeneratorEventKind,
}

impl GeneratorEvent {
    pub(crate) fn new(owner: ComponentId, kind: GeneratorEventKind) -> Self {
        GeneratorEvent { owner, kind }
    }

    /// The generator that scheduled this event.
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn kind(&self) -> &GeneratorEventKind {
        &self.kind
    }
}

// ── Queue ─────────────────────────────────────────────────────────────

/// What a queue event does.
#[derive(Debug, PartialEq, Eq)]
pub enum QueueEventKind<L> {
    /// Append the load to the tail of the waiting line.
    Enqueue(L),
    /// Release the head of the waiting line if dequeuing is enabled.
    Dequeue,
    /// Enable or disable dequeuing.
    UpdateToDequeue(bool),
}

/// An event addressed to a [`Queue`](super::Queue).
#[derive(Debug, PartialEq, Eq)]
pub struct QueueEvent<L> {
    owner: ComponentId,
    kind: QueueEventKind<L>,
}

impl<L> QueueEvent<L> {
    pub(crate) fn new(owner: ComponentId, kind: QueueEventKind<L>) -> Self {
        QueueEvent { owner, kind }
    }

    /// The queue that scheduled this event.
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn kind(&self) -> &QueueEventKind<L> {
        &self.kind
    }

    pub(crate) fn into_kind(self) -> QueueEventKind<L> {
        self.kind
    }
}

// ── Server ────────────────────────────────────────────────────────────

/// What a server event does.
#[derive(Debug, PartialEq, Eq)]
pub enum ServerEventKind<L> {
    /// The load's service time has elapsed.
    ServiceComplete(L),
}

/// An event addressed to a [`Server`](super::Server).
#[derive(Debug, PartialEq, Eq)]
pub struct ServerEvent<L> {
    owner: ComponentId,
    kind: ServerEventKind<L>,
}

impl<L> ServerEvent<L> {
    pub(crate) fn new(owner: ComponentId, kind: ServerEventKind<L>) -> Self {
        ServerEvent { owner, kind }
    }

    /// The server that scheduled this event.
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn kind(&self) -> &ServerEventKind<L> {
        &self.kind
    }

    pub(crate) fn into_kind(self) -> ServerEventKind<L> {
        self.kind
    }
}

// ── ComponentEvent ────────────────────────────────────────────────────

/// Ready-made payload type for models built only from the stock
/// components. Models with their own events define an enum with the
/// same `From` conversions instead.
#[derive(Debug, PartialEq, Eq)]
pub enum ComponentEvent<L> {
    Generator(GeneratorEvent),
    Queue(QueueEvent<L>),
    Server(ServerEvent<L>),
}

impl<L> From<GeneratorEvent> for ComponentEvent<L> {
    fn from(event: GeneratorEvent) -> Self {
        ComponentEvent::Generator(event)
    }
}

impl<L> From<QueueEvent<L>> for ComponentEvent<L> {
    fn from(event: QueueEvent<L>) -> Self {
        ComponentEvent::Queue(event)
    }
}

impl<L> From<ServerEvent<L>> for ComponentEvent<L> {
    fn from(event: ServerEvent<L>) -> Self {
        ComponentEvent::Server(event)
    }
}

/// Reject an event routed to a component other than its owner.
pub(crate) fn ensure_owner(component: ComponentId, owner: ComponentId) -> SimResult<()> {
    if component != owner {
        return Err(SimError::InvalidArgument(format!(
            "event owned by {} routed to {}",
            owner, component
        )));
    }
    Ok(())
}
