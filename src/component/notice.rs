//! Notifications raised by components and the observer lists that
//! deliver them.
//!
//! A notice is raised after the state change it reports has completed.
//! It is delivered in-line, first to every subscribed observer in
//! subscription order, then returned to the caller of `execute` so a
//! routing model can feed it into the next component.

use crate::time::SimTime;

/// Raised by a [`Generator`](super::Generator).
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorNotice<L> {
    LoadGenerated { load: L, time: SimTime },
}

/// Raised by a [`Queue`](super::Queue).
#[derive(Debug, Clone, PartialEq)]
pub enum QueueNotice<L> {
    LoadEnqueued { load: L, time: SimTime },
    LoadDequeued { load: L, time: SimTime },
    /// The queue was full when the enqueue was requested.
    LoadBalked { load: L, time: SimTime },
}

/// Raised by a [`Server`](super::Server).
#[derive(Debug, Clone, PartialEq)]
pub enum ServerNotice<L> {
    /// The set of loads in service changed.
    StateChanged { time: SimTime, in_service: usize },
    /// A load finished service; `started_at` reflects any warm-up reset.
    LoadDeparted {
        load: L,
        time: SimTime,
        started_at: SimTime,
    },
}

/// Synchronous listeners for one kind of notice.
pub struct Observers<N> {
    listeners: Vec<Box<dyn FnMut(&N)>>,
}

impl<N> Observers<N> {
    pub fn new() -> Self {
        Observers {
            listeners: Vec::new(),
        }
    }

    /// Add a listener; listeners run in subscription order.
    pub fn subscribe(&mut self, listener: impl FnMut(&N) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver `notice` to every listener.
    pub fn notify(&mut self, notice: &N) {
        for listener in &mut self.listeners {
            listener(notice);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<N> Default for Observers<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> std::fmt::Debug for Observers<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
