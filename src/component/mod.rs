//! Reusable simulation components.
//!
//! Each component is an event-driven state machine that schedules its own
//! events through a [`RunContext`](crate::simulation::RunContext) and
//! mutates its state only when those events come back through its
//! `execute`. State changes are reported to subscribed observers and
//! returned to the caller as notices.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`ComponentId`], [`ComponentIdGen`] |
//! | [`event`] | per-component event payloads, [`ComponentEvent`] |
//! | [`notice`] | notice enums and [`Observers`] |
//! | [`sampling`] | sampler aliases and stock samplers |
//! | [`generator`] | [`Generator`] |
//! | [`queue`] | [`Queue`] |
//! | [`server`] | [`Server`] |
//! | [`pipeline`] | [`Pipeline`] reference model |

pub mod event;
pub mod generator;
pub mod id;
pub mod notice;
pub mod pipeline;
pub mod queue;
pub mod sampling;
pub mod server;

pub use event::{
    ComponentEvent, GeneratorEvent, GeneratorEventKind, QueueEvent, QueueEventKind, ServerEvent,
    ServerEventKind,
};
pub use generator::{Generator, GeneratorBuilder};
pub use id::{ComponentId, ComponentIdGen};
pub use notice::{GeneratorNotice, Observers, QueueNotice, ServerNotice};
pub use pipeline::{Pipeline, PipelineStats};
pub use queue::{Queue, QueueBuilder};
pub use server::{Server, ServerBuilder};

#[cfg(test)]
mod tests;
