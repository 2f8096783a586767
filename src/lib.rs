//! # Kairos: Deterministic Discrete-Event Simulation Kernel
//!
//! A kernel for building discrete-event simulation models out of
//! event-driven state machines. No async, no threads, no wall-clock
//! time: a single loop pops the earliest pending event, advances the
//! clock to it and hands it to the root model.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────┐
//! │        Simulation          │ ← main loop, warm-up, stop policy
//! │  ┌──────────────────────┐  │
//! │  │    RunStrategy       │  │ ← continue? warm-up end?
//! │  └──────────────────────┘  │
//! │  ┌──────────────────────┐  │
//! │  │  FutureEventList     │  │ ← min-heap on (time, id)
//! │  └──────────────────────┘  │
//! │  ┌──────────────────────┐  │
//! │  │  Model (root)        │  │ ← routes events to components
//! │  │   Generator ─▶ Queue │  │
//! │  │        ─▶ Server     │  │ ← notices wire them together
//! │  └──────────────────────┘  │
//! └────────────────────────────┘
//! ```
//!
//! Handlers see the engine through a [`RunContext`]: the clock and the
//! executed-event count read-only, plus the [`Scheduler`] capability.
//! Events at equal times run in scheduling order, and every component
//! draws randomness from its own seeded stream, so a run is fully
//! reproducible from its configuration.

pub mod component;
pub mod error;
pub mod event;
pub mod model;
pub mod scheduler;
pub mod simulation;
pub mod stats;
pub mod strategy;
pub mod time;
pub mod trace;

// Re-exports for convenience.
pub use component::{
    ComponentEvent, ComponentId, ComponentIdGen, Generator, Pipeline, Queue, Server,
};
pub use error::{ErrorKind, SimError, SimResult};
pub use event::{Event, EventId, EventIdGen};
pub use model::Model;
pub use scheduler::{FutureEventList, Scheduler};
pub use simulation::{
    EngineState, RunContext, RunReport, RunStatus, Simulation, StepOutcome, StopReason,
};
pub use stats::OccupancyCounter;
pub use strategy::{Conditional, DurationBound, EventCountBound, RunConfig, RunStrategy, Unbounded};
pub use time::SimTime;
pub use trace::{ExecutionTrace, TraceEntry};
