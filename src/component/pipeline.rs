//! Generator → Queue → Server reference model.
//!
//! Wires the three stock components through the notices their `execute`
//! returns, using nothing but their public API:
//!
//! ```text
//!  LoadGenerated ──▶ try_schedule_enqueue ──(full)──▶ balk   (before the next Arrive)
//!  LoadEnqueued  ──▶ pull
//!  LoadDequeued  ──▶ try_start_service
//!  LoadDeparted  ──▶ pull
//! ```
//!
//! `pull` asks the queue for as many dequeues as the server has free
//! slots, counting dequeues already in flight so that same-instant
//! requests never hand the server more loads than it can take.

use std::hash::Hash;

use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::event::Event;
use crate::model::Model;
use crate::simulation::RunContext;
use crate::time::SimTime;

use super::event::{ComponentEvent, QueueEventKind};
use super::generator::Generator;
use super::notice::{GeneratorNotice, QueueNotice, ServerNotice};
use super::queue::Queue;
use super::server::Server;

/// Counters kept by a [`Pipeline`] since the last warm-up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineStats {
    pub generated: u64,
    pub balked: u64,
    pub entered_service: u64,
    pub departed: u64,
    /// Sum of `departure - start` over departed loads.
    pub total_service_time: f64,
}

impl PipelineStats {
    /// Mean time in service of departed loads, if any departed.
    pub fn mean_service_time(&self) -> Option<f64> {
        if self.departed == 0 {
            None
        } else {
            Some(self.total_service_time / self.departed as f64)
        }
    }
}

/// A single-stage queueing system.
#[derive(Debug)]
pub struct Pipeline<L> {
    generator: Generator<L>,
    queue: Queue<L>,
    server: Server<L>,
    /// Dequeue events scheduled but not yet executed.
    pending_dequeues: usize,
    stats: PipelineStats,
}

impl<L> Pipeline<L>
where
    L: Clone + Eq + Hash + std::fmt::Debug,
{
    pub fn new(generator: Generator<L>, queue: Queue<L>, server: Server<L>) -> Self {
        Pipeline {
            generator,
            queue,
            server,
            pending_dequeues: 0,
            stats: PipelineStats::default(),
        }
    }

    pub fn generator(&self) -> &Generator<L> {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut Generator<L> {
        &mut self.generator
    }

    pub fn queue(&self) -> &Queue<L> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Queue<L> {
        &mut self.queue
    }

    pub fn server(&self) -> &Server<L> {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut Server<L> {
        &mut self.server
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    fn pull(&mut self, ctx: &mut RunContext<'_, ComponentEvent<L>>) -> SimResult<()> {
        while self.server.vacancy() > self.pending_dequeues
            && self.queue.occupancy() > self.pending_dequeues
        {
            if !self.queue.trigger_dequeue_attempt(ctx)? {
                break;
            }
            self.pending_dequeues += 1;
        }
        Ok(())
    }

    fn on_queue(
        &mut self,
        ctx: &mut RunContext<'_, ComponentEvent<L>>,
        notices: Vec<QueueNotice<L>>,
    ) -> SimResult<()> {
        for notice in notices {
            match notice {
                QueueNotice::LoadEnqueued { .. } => self.pull(ctx)?,
                QueueNotice::LoadDequeued { load, time } => {
                    if !self.server.try_start_service(load, ctx)? {
                        return Err(SimError::InvalidOperation(format!(
                            "server {} full when queue {} released a load at {}",
                            self.server.id(),
                            self.queue.id(),
                            time
                        )));
                    }
                    self.stats.entered_service += 1;
                }
                QueueNotice::LoadBalked { .. } => {}
            }
        }
        Ok(())
    }

    fn on_server(
        &mut self,
        ctx: &mut RunContext<'_, ComponentEvent<L>>,
        notices: Vec<ServerNotice<L>>,
    ) -> SimResult<()> {
        for notice in notices {
            if let ServerNotice::LoadDeparted { time, started_at, .. } = notice {
                self.stats.departed += 1;
                self.stats.total_service_time += time.since(started_at);
                self.pull(ctx)?;
            }
        }
        Ok(())
    }
}

impl<L> Model for Pipeline<L>
where
    L: Clone + Eq + Hash + std::fmt::Debug,
{
    type Event = ComponentEvent<L>;

    fn initialize(&mut self, ctx: &mut RunContext<'_, Self::Event>) -> SimResult<()> {
        self.queue.initialize(ctx)?;
        self.server.initialize(ctx)?;
        self.generator.initialize(ctx)?;
        debug!(
            generator = %self.generator.id(),
            queue = %self.queue.id(),
            server = %self.server.id(),
            "Pipeline initialized"
        );
        Ok(())
    }

    fn warmed_up(&mut self, time: SimTime) {
        self.generator.warmed_up(time);
        self.queue.warmed_up(time);
        self.server.warmed_up(time);
        self.stats = PipelineStats::default();
    }

    fn execute(
        &mut self,
        ctx: &mut RunContext<'_, Self::Event>,
        event: Event<Self::Event>,
    ) -> SimResult<()> {
        trace!(event = %event.id, clock = %ctx.clock_time(), "Routing event");
        match event.payload {
            ComponentEvent::Generator(ev) => {
                let queue = &mut self.queue;
                let stats = &mut self.stats;
                self.generator.execute_with(ctx, ev, |ctx, notice| {
                    let GeneratorNotice::LoadGenerated { load, .. } = notice;
                    stats.generated += 1;
                    if !queue.try_schedule_enqueue(load.clone(), ctx)? {
                        stats.balked += 1;
                    }
                    Ok(())
                })?;
                Ok(())
            }
            ComponentEvent::Queue(ev) => {
                if matches!(ev.kind(), QueueEventKind::Dequeue) && ev.owner() == self.queue.id() {
                    self.pending_dequeues = self.pending_dequeues.saturating_sub(1);
                }
                let notices = self.queue.execute(ctx, ev)?;
                self.on_queue(ctx, notices)
            }
            ComponentEvent::Server(ev) => {
                let notices = self.server.execute(ctx, ev)?;
                self.on_server(ctx, notices)
            }
        }
    }
}
