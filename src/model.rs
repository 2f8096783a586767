//! `Model`: the root of a simulated system.

use crate::error::SimResult;
use crate::event::Event;
use crate::simulation::RunContext;
use crate::time::SimTime;

/// Trait implemented by the root model handed to a [`Simulation`].
///
/// The engine calls `initialize` once before the main loop, `warmed_up`
/// at most once when the warm-up threshold is crossed, and `execute` for
/// every popped event. A root model cascades `initialize` and
/// `warmed_up` to its components and routes events to them.
///
/// # Contract
///
/// Implementations **must**:
/// - Route all scheduling through `ctx`.
/// - Not pop or execute events themselves.
/// - Be deterministic for equal inputs (randomness comes from seeded,
///   component-owned streams).
///
/// [`Simulation`]: crate::simulation::Simulation
pub trait Model {
    /// Payload type carried by this model's events.
    type Event;

    /// Called once before the main loop; may schedule the first events.
    fn initialize(&mut self, ctx: &mut RunContext<'_, Self::Event>) -> SimResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once when the clock first reaches the warm-up end time,
    /// before the event at that time executes.
    fn warmed_up(&mut self, time: SimTime) {
        let _ = time;
    }

    /// Execute one popped event.
    fn execute(
        &mut self,
        ctx: &mut RunContext<'_, Self::Event>,
        event: Event<Self::Event>,
    ) -> SimResult<()>;
}
