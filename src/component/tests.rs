//! Scenario tests for the stock components.
//!
//! Most tests drive a component by hand through a bare future event list,
//! popping and routing events the way the engine would. The last batch
//! runs a custom model under the real engine.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;

use crate::component::sampling::{constant, exponential, sequence};
use crate::component::{
    ComponentIdGen, Generator, GeneratorEvent, GeneratorNotice, Queue, QueueEvent, QueueEventKind,
    QueueNotice, Server, ServerEvent, ServerNotice,
};
use crate::error::{ErrorKind, SimError, SimResult};
use crate::event::Event;
use crate::model::Model;
use crate::scheduler::FutureEventList;
use crate::simulation::{RunContext, Simulation, StopReason};
use crate::strategy::DurationBound;
use crate::time::SimTime;

// ── Bench ─────────────────────────────────────────────────────────────

/// Payload type of a hand-written model: the components only require the
/// `From` conversions.
#[derive(Debug)]
enum BenchEvent {
    Gen(GeneratorEvent),
    Queue(QueueEvent<u64>),
    Server(ServerEvent<u64>),
}

impl From<GeneratorEvent> for BenchEvent {
    fn from(ev: GeneratorEvent) -> Self {
        BenchEvent::Gen(ev)
    }
}

impl From<QueueEvent<u64>> for BenchEvent {
    fn from(ev: QueueEvent<u64>) -> Self {
        BenchEvent::Queue(ev)
    }
}

impl From<ServerEvent<u64>> for BenchEvent {
    fn from(ev: ServerEvent<u64>) -> Self {
        BenchEvent::Server(ev)
    }
}

impl BenchEvent {
    fn into_gen(self) -> GeneratorEvent {
        match self {
            BenchEvent::Gen(ev) => ev,
            other => panic!("expected a generator event, got {:?}", other),
        }
    }

    fn into_queue(self) -> QueueEvent<u64> {
        match self {
            BenchEvent::Queue(ev) => ev,
            other => panic!("expected a queue event, got {:?}", other),
        }
    }

    fn into_server(self) -> ServerEvent<u64> {
        match self {
            BenchEvent::Server(ev) => ev,
            other => panic!("expected a server event, got {:?}", other),
        }
    }
}

/// A future event list plus a clock, standing in for the engine.
struct Bench {
    fel: FutureEventList<BenchEvent>,
    clock: SimTime,
    executed: u64,
}

impl Bench {
    fn at(time: f64) -> Self {
        Bench {
            fel: FutureEventList::new(),
            clock: SimTime::new(time),
            executed: 0,
        }
    }

    fn ctx(&mut self) -> RunContext<'_, BenchEvent> {
        RunContext::new(&mut self.fel, self.clock, self.executed)
    }

    /// Pop the next event and advance the clock to it.
    fn pop(&mut self) -> Event<BenchEvent> {
        let ev = self.fel.pop_next().expect("future event list is empty");
        assert!(ev.scheduled_at >= self.clock);
        self.clock = ev.scheduled_at;
        self.executed += 1;
        ev
    }

    fn pending(&self) -> usize {
        self.fel.len()
    }
}

fn recorder<N: Clone + 'static>() -> (Rc<RefCell<Vec<N>>>, impl FnMut(&N) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |n: &N| sink.borrow_mut().push(n.clone()))
}

fn ticking_generator(ids: &mut ComponentIdGen, every: f64, start_at: Option<f64>) -> Generator<u64> {
    Generator::builder(ids.next_id(), 7)
        .inter_arrival(constant(every))
        .load_factory(sequence(1))
        .start_at(start_at.map(SimTime::new))
        .build()
        .unwrap()
}

/// Run the generator until it has produced `n` loads, returning each
/// load with its generation time.
fn generate(gen: &mut Generator<u64>, bench: &mut Bench, n: usize) -> Vec<(u64, f64)> {
    let mut out = Vec::new();
    while out.len() < n {
        let ev = bench.pop();
        for notice in gen.execute(&mut bench.ctx(), ev.payload.into_gen()).unwrap() {
            let GeneratorNotice::LoadGenerated { load, time } = notice;
            out.push((load, time.value()));
        }
    }
    out
}

// ── Queue ─────────────────────────────────────────────────────────────

#[test]
fn test_full_queue_balks_second_load() {
    let mut ids = ComponentIdGen::new();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).capacity(1).build().unwrap();
    let (observed, listener) = recorder::<QueueNotice<u64>>();
    queue.subscribe(listener);

    let mut bench = Bench::at(0.0);
    queue.initialize(&mut bench.ctx()).unwrap();

    assert!(queue.try_schedule_enqueue(1, &mut bench.ctx()).unwrap());
    let ev = bench.pop();
    let notices = queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap();
    assert_eq!(notices, vec![QueueNotice::LoadEnqueued { load: 1, time: SimTime::ZERO }]);

    assert!(!queue.try_schedule_enqueue(2, &mut bench.ctx()).unwrap());
    assert_eq!(bench.pending(), 0);
    assert_eq!(queue.occupancy(), 1);
    assert_eq!(queue.vacancy(), Some(0));
    assert_eq!(queue.waiting().copied().collect::<Vec<_>>(), vec![1]);

    let seen = observed.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1], QueueNotice::LoadBalked { load: 2, time: SimTime::ZERO });
}

#[test]
fn test_same_instant_enqueues_respect_capacity() {
    let mut ids = ComponentIdGen::new();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).capacity(2).build().unwrap();
    let mut bench = Bench::at(3.0);
    queue.initialize(&mut bench.ctx()).unwrap();

    let accepted: Vec<bool> = (1..=4)
        .map(|load| queue.try_schedule_enqueue(load, &mut bench.ctx()).unwrap())
        .collect();
    assert_eq!(accepted, vec![true, true, false, false]);
    assert_eq!(queue.pending_enqueue_count(), 2);
    assert_eq!(queue.occupancy(), 0);

    while bench.pending() > 0 {
        let ev = bench.pop();
        queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap();
        assert_eq!(queue.occupancy() + queue.vacancy().unwrap(), 2);
    }
    assert_eq!(queue.occupancy(), 2);
    assert_eq!(queue.pending_enqueue_count(), 0);
}

#[test]
fn test_dequeue_is_fifo_and_gated_by_flag() {
    let mut ids = ComponentIdGen::new();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).to_dequeue(false).build().unwrap();
    let mut bench = Bench::at(0.0);
    queue.initialize(&mut bench.ctx()).unwrap();
    assert_eq!(queue.capacity(), None);
    assert_eq!(queue.vacancy(), None);

    for load in [10, 20, 30] {
        assert!(queue.try_schedule_enqueue(load, &mut bench.ctx()).unwrap());
    }
    for _ in 0..3 {
        let ev = bench.pop();
        queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap();
    }

    // Disabled: no event is scheduled.
    assert!(!queue.trigger_dequeue_attempt(&mut bench.ctx()).unwrap());
    assert_eq!(bench.pending(), 0);

    // The flag change travels through the event list.
    queue.schedule_update_to_dequeue(true, &mut bench.ctx()).unwrap();
    assert!(!queue.to_dequeue());
    let ev = bench.pop();
    assert!(queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap().is_empty());
    assert!(queue.to_dequeue());

    let mut released = Vec::new();
    while queue.trigger_dequeue_attempt(&mut bench.ctx()).unwrap() {
        let ev = bench.pop();
        for notice in queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap() {
            if let QueueNotice::LoadDequeued { load, .. } = notice {
                released.push(load);
            }
        }
    }
    assert_eq!(released, vec![10, 20, 30]);
    assert_eq!(queue.occupancy(), 0);
}

#[test]
fn test_flag_update_ordered_after_same_instant_dequeue() {
    let mut ids = ComponentIdGen::new();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).build().unwrap();
    let mut bench = Bench::at(0.0);
    queue.initialize(&mut bench.ctx()).unwrap();
    queue.try_schedule_enqueue(1, &mut bench.ctx()).unwrap();
    let ev = bench.pop();
    queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap();

    // Dequeue scheduled first, flag cleared right after at the same instant.
    assert!(queue.trigger_dequeue_attempt(&mut bench.ctx()).unwrap());
    queue.schedule_update_to_dequeue(false, &mut bench.ctx()).unwrap();

    let dequeue = bench.pop();
    let update = bench.pop();
    // FIFO at equal times: the dequeue runs first and still sees the flag set.
    let notices = queue.execute(&mut bench.ctx(), dequeue.payload.into_queue()).unwrap();
    assert_eq!(notices.len(), 1);
    queue.execute(&mut bench.ctx(), update.payload.into_queue()).unwrap();
    assert!(!queue.to_dequeue());
}

#[test]
fn test_queue_warm_up_keeps_occupancy() {
    let mut ids = ComponentIdGen::new();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).build().unwrap();
    let mut bench = Bench::at(0.0);
    queue.initialize(&mut bench.ctx()).unwrap();
    for load in 0..3 {
        queue.try_schedule_enqueue(load, &mut bench.ctx()).unwrap();
    }
    for _ in 0..3 {
        let ev = bench.pop();
        queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap();
    }

    queue.warmed_up(SimTime::new(40.0));
    assert_eq!(queue.occupancy(), 3);
    let counter = queue.occupancy_counter();
    assert_eq!(counter.baseline(), SimTime::new(40.0));
    assert_eq!(counter.last_count(), 3);
    assert_eq!(counter.increments(), 0);
}

#[test]
fn test_zero_capacity_rejected() {
    let err = Queue::<u64>::builder(ComponentIdGen::new().next_id())
        .capacity(0)
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

#[test]
fn test_enqueue_without_reservation_is_rejected() {
    let mut ids = ComponentIdGen::new();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).capacity(1).build().unwrap();
    let mut bench = Bench::at(0.0);
    queue.initialize(&mut bench.ctx()).unwrap();

    assert!(queue.try_schedule_enqueue(1, &mut bench.ctx()).unwrap());
    let ev = bench.pop();
    queue.execute(&mut bench.ctx(), ev.payload.into_queue()).unwrap();

    let stray = QueueEvent::new(queue.id(), QueueEventKind::Enqueue(2));
    let err = queue.execute(&mut bench.ctx(), stray).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(queue.occupancy(), 1);
    assert_eq!(queue.vacancy(), Some(0));
    assert_eq!(queue.pending_enqueue_count(), 0);
    assert_eq!(queue.waiting().copied().collect::<Vec<_>>(), vec![1]);
}

// ── Server ────────────────────────────────────────────────────────────

fn fixed_server(ids: &mut ComponentIdGen, capacity: usize, service: f64) -> Server<u64> {
    Server::builder(ids.next_id(), 11)
        .capacity(capacity)
        .service_time_sampler(constant(service))
        .build()
        .unwrap()
}

#[test]
fn test_service_completes_after_fixed_time() {
    let mut ids = ComponentIdGen::new();
    let mut server = fixed_server(&mut ids, 1, 5.0);
    let (seen, listener) = recorder::<ServerNotice<u64>>();
    server.subscribe(listener);

    let mut bench = Bench::at(10.0);
    server.initialize(&mut bench.ctx()).unwrap();
    assert!(server.try_start_service(1, &mut bench.ctx()).unwrap());
    assert_eq!(server.service_start_time(&1), Some(SimTime::new(10.0)));

    let ev = bench.pop();
    assert_eq!(ev.scheduled_at, SimTime::new(15.0));
    let notices = server.execute(&mut bench.ctx(), ev.payload.into_server()).unwrap();

    assert_eq!(server.occupancy(), 0);
    assert_eq!(
        notices,
        vec![
            ServerNotice::StateChanged { time: SimTime::new(15.0), in_service: 0 },
            ServerNotice::LoadDeparted {
                load: 1,
                time: SimTime::new(15.0),
                started_at: SimTime::new(10.0),
            },
        ]
    );
    // Observers saw the start as well as both completion notices.
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(
        seen.borrow()[0],
        ServerNotice::StateChanged { time: SimTime::new(10.0), in_service: 1 }
    );
}

#[test]
fn test_full_server_refuses_without_side_effects() {
    let mut ids = ComponentIdGen::new();
    let mut server = fixed_server(&mut ids, 1, 5.0);
    let mut bench = Bench::at(0.0);
    server.initialize(&mut bench.ctx()).unwrap();

    assert!(server.try_start_service(1, &mut bench.ctx()).unwrap());
    let pending = bench.pending();
    assert!(!server.try_start_service(2, &mut bench.ctx()).unwrap());

    assert_eq!(bench.pending(), pending);
    assert_eq!(server.occupancy(), 1);
    assert_eq!(server.vacancy(), 0);
    assert_eq!(server.service_start_time(&2), None);
}

#[test]
fn test_concurrent_service_up_to_capacity() {
    let mut ids = ComponentIdGen::new();
    let mut server = Server::builder(ids.next_id(), 3)
        .capacity(3)
        .service_time(|load: &u64, _rng| *load as f64)
        .build()
        .unwrap();
    let mut bench = Bench::at(0.0);
    server.initialize(&mut bench.ctx()).unwrap();

    for load in [3, 1, 2] {
        assert!(server.try_start_service(load, &mut bench.ctx()).unwrap());
    }
    assert!(!server.try_start_service(4, &mut bench.ctx()).unwrap());
    assert_eq!(server.loads_in_service().copied().collect::<Vec<_>>(), vec![3, 1, 2]);

    let mut departures = Vec::new();
    while bench.pending() > 0 {
        let ev = bench.pop();
        for notice in server.execute(&mut bench.ctx(), ev.payload.into_server()).unwrap() {
            if let ServerNotice::LoadDeparted { load, time, .. } = notice {
                departures.push((load, time.value()));
            }
        }
        assert!(server.occupancy() <= server.capacity());
    }
    assert_eq!(departures, vec![(1, 1.0), (2, 2.0), (3, 3.0)]);
}

#[test]
fn test_server_warm_up_resets_start_times() {
    let mut ids = ComponentIdGen::new();
    let mut server = fixed_server(&mut ids, 2, 100.0);
    let mut bench = Bench::at(5.0);
    server.initialize(&mut bench.ctx()).unwrap();
    server.try_start_service(1, &mut bench.ctx()).unwrap();
    server.try_start_service(2, &mut bench.ctx()).unwrap();

    server.warmed_up(SimTime::new(50.0));
    assert_eq!(server.occupancy(), 2);
    assert_eq!(server.service_start_time(&1), Some(SimTime::new(50.0)));
    assert_eq!(server.service_start_time(&2), Some(SimTime::new(50.0)));

    let ev = bench.pop();
    let notices = server.execute(&mut bench.ctx(), ev.payload.into_server()).unwrap();
    assert!(notices.contains(&ServerNotice::LoadDeparted {
        load: 1,
        time: SimTime::new(105.0),
        started_at: SimTime::new(50.0),
    }));
}

#[test]
fn test_server_misuse() {
    let mut ids = ComponentIdGen::new();
    let mut server = fixed_server(&mut ids, 2, 1.0);
    let mut bench = Bench::at(0.0);

    let err = server.try_start_service(1, &mut bench.ctx()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    server.initialize(&mut bench.ctx()).unwrap();
    server.try_start_service(1, &mut bench.ctx()).unwrap();
    let err = server.try_start_service(1, &mut bench.ctx()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let missing = Server::<u64>::builder(ids.next_id(), 0).build().unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::InvalidArgument);
    let zero = Server::<u64>::builder(ids.next_id(), 0)
        .capacity(0)
        .service_time_sampler(constant(1.0))
        .build()
        .unwrap_err();
    assert_eq!(zero.kind(), ErrorKind::OutOfRange);
}

// ── Generator ─────────────────────────────────────────────────────────

#[test]
fn test_generator_first_arrival_at_start() {
    let mut ids = ComponentIdGen::new();
    let mut gen = ticking_generator(&mut ids, 5.0, Some(10.0));
    let mut bench = Bench::at(0.0);
    gen.initialize(&mut bench.ctx()).unwrap();
    assert!(!gen.is_active());

    let start = bench.pop();
    assert_eq!(start.scheduled_at, SimTime::new(10.0));
    gen.execute(&mut bench.ctx(), start.payload.into_gen()).unwrap();
    assert!(gen.is_active());
    assert_eq!(gen.start_time(), Some(SimTime::new(10.0)));

    let loads = generate(&mut gen, &mut bench, 2);
    assert_eq!(loads, vec![(1, 10.0), (2, 15.0)]);
    assert_eq!(gen.loads_generated_count(), 2);
}

#[test]
fn test_generator_skip_first() {
    let mut ids = ComponentIdGen::new();
    let mut gen = Generator::builder(ids.next_id(), 1)
        .inter_arrival(constant(4.0))
        .load_factory(sequence(0))
        .skip_first(true)
        .build()
        .unwrap();
    let mut bench = Bench::at(0.0);
    gen.initialize(&mut bench.ctx()).unwrap();
    assert!(gen.is_skipping_first());

    let loads = generate(&mut gen, &mut bench, 2);
    assert_eq!(loads, vec![(0, 4.0), (1, 8.0)]);
}

#[test]
fn test_generator_warm_up_keeps_activity() {
    let mut ids = ComponentIdGen::new();
    let mut gen = ticking_generator(&mut ids, 5.0, Some(10.0));
    let mut bench = Bench::at(0.0);
    gen.initialize(&mut bench.ctx()).unwrap();

    generate(&mut gen, &mut bench, 7);
    assert_eq!(gen.loads_generated_count(), 7);
    assert_eq!(gen.start_time(), Some(SimTime::new(10.0)));

    gen.warmed_up(SimTime::new(100.0));
    assert_eq!(gen.start_time(), Some(SimTime::new(100.0)));
    assert_eq!(gen.loads_generated_count(), 0);
    assert!(gen.is_active());
}

#[test]
fn test_same_seed_same_loads() {
    fn build(ids: &mut ComponentIdGen) -> Generator<u64> {
        Generator::builder(ids.next_id(), 2024)
            .inter_arrival(exponential(3.0).unwrap())
            .load_factory(|rng| rng.gen_range(0..1_000u64))
            .build()
            .unwrap()
    }

    let runs: Vec<Vec<(u64, f64)>> = (0..2)
        .map(|_| {
            let mut ids = ComponentIdGen::new();
            let mut gen = build(&mut ids);
            let mut bench = Bench::at(0.0);
            gen.initialize(&mut bench.ctx()).unwrap();
            generate(&mut gen, &mut bench, 25)
        })
        .collect();

    assert_eq!(runs[0], runs[1]);
    // Times strictly increase with a continuous inter-arrival distribution.
    assert!(runs[0].windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn test_stop_then_restart_leaves_one_arrival_chain() {
    let mut ids = ComponentIdGen::new();
    let mut gen = ticking_generator(&mut ids, 5.0, None);
    let mut bench = Bench::at(0.0);
    gen.initialize(&mut bench.ctx()).unwrap();
    assert_eq!(bench.pending(), 0);

    gen.schedule_start(&mut bench.ctx()).unwrap();
    generate(&mut gen, &mut bench, 1);
    // Next arrival pending at T=5.

    gen.schedule_stop_at(&mut bench.ctx(), SimTime::new(2.0)).unwrap();
    gen.schedule_start_at(&mut bench.ctx(), SimTime::new(3.0)).unwrap();

    let stop = bench.pop();
    gen.execute(&mut bench.ctx(), stop.payload.into_gen()).unwrap();
    assert!(!gen.is_active());
    let start = bench.pop();
    gen.execute(&mut bench.ctx(), start.payload.into_gen()).unwrap();
    assert!(gen.is_active());

    let loads = generate(&mut gen, &mut bench, 3);
    let times: Vec<f64> = loads.iter().map(|&(_, t)| t).collect();
    // The old T=5 arrival is discarded; the new chain runs 3, 8, 13.
    assert_eq!(times, vec![3.0, 8.0, 13.0]);
    assert_eq!(gen.loads_generated_count(), 3);
}

#[test]
fn test_duplicate_start_and_stop_are_noops() {
    let mut ids = ComponentIdGen::new();
    let mut gen = ticking_generator(&mut ids, 1.0, None);
    let mut bench = Bench::at(0.0);
    gen.initialize(&mut bench.ctx()).unwrap();

    gen.schedule_stop(&mut bench.ctx()).unwrap();
    let stop = bench.pop();
    gen.execute(&mut bench.ctx(), stop.payload.into_gen()).unwrap();
    assert!(!gen.is_active());

    gen.schedule_start(&mut bench.ctx()).unwrap();
    gen.schedule_start(&mut bench.ctx()).unwrap();
    for _ in 0..2 {
        let ev = bench.pop();
        gen.execute(&mut bench.ctx(), ev.payload.into_gen()).unwrap();
    }
    // Only the first start scheduled an arrival.
    assert_eq!(bench.pending(), 1);
}

#[test]
fn test_generator_misuse() {
    let mut ids = ComponentIdGen::new();
    let gen = ticking_generator(&mut ids, 1.0, None);
    let mut bench = Bench::at(0.0);
    let err = gen.schedule_start(&mut bench.ctx()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let missing = Generator::<u64>::builder(ids.next_id(), 0)
        .inter_arrival(constant(1.0))
        .build()
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_event_routed_to_wrong_component() {
    let mut ids = ComponentIdGen::new();
    let mut a = ticking_generator(&mut ids, 1.0, Some(0.0));
    let mut b = ticking_generator(&mut ids, 1.0, Some(0.0));
    let mut bench = Bench::at(0.0);
    a.initialize(&mut bench.ctx()).unwrap();
    b.initialize(&mut bench.ctx()).unwrap();

    let a_start = bench.pop();
    let err = b.execute(&mut bench.ctx(), a_start.payload.into_gen()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(!b.is_active());
}

#[test]
fn test_routed_enqueue_runs_before_zero_delay_arrival() {
    let mut ids = ComponentIdGen::new();
    let mut gen: Generator<u64> = Generator::builder(ids.next_id(), 3)
        .inter_arrival(constant(0.0))
        .load_factory(sequence(1))
        .build()
        .unwrap();
    let mut queue: Queue<u64> = Queue::builder(ids.next_id()).capacity(1).build().unwrap();
    let mut bench = Bench::at(0.0);
    queue.initialize(&mut bench.ctx()).unwrap();
    gen.initialize(&mut bench.ctx()).unwrap();

    let start = bench.pop();
    gen.execute(&mut bench.ctx(), start.payload.into_gen()).unwrap();

    let arrive = bench.pop();
    let notices = gen
        .execute_with(&mut bench.ctx(), arrive.payload.into_gen(), |ctx, notice| {
            let GeneratorNotice::LoadGenerated { load, .. } = notice;
            assert!(queue.try_schedule_enqueue(*load, ctx)?);
            Ok(())
        })
        .unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(gen.loads_generated_count(), 1);

    // Same instant: the enqueue was scheduled first, then the next arrival.
    let next = bench.pop();
    assert_eq!(next.scheduled_at, SimTime::ZERO);
    queue.execute(&mut bench.ctx(), next.payload.into_queue()).unwrap();
    assert_eq!(queue.occupancy(), 1);

    let next = bench.pop();
    assert_eq!(next.scheduled_at, SimTime::ZERO);
    assert_eq!(next.payload.into_gen().owner(), gen.id());
    assert_eq!(bench.pending(), 0);
}

#[test]
fn test_routing_error_stops_the_arrival_chain() {
    let mut ids = ComponentIdGen::new();
    let mut gen = ticking_generator(&mut ids, 1.0, Some(0.0));
    let mut bench = Bench::at(0.0);
    gen.initialize(&mut bench.ctx()).unwrap();
    let start = bench.pop();
    gen.execute(&mut bench.ctx(), start.payload.into_gen()).unwrap();

    let arrive = bench.pop();
    let err = gen
        .execute_with(&mut bench.ctx(), arrive.payload.into_gen(), |_, _| {
            Err(SimError::InvalidOperation("downstream refused".into()))
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(gen.loads_generated_count(), 0);
    assert_eq!(bench.pending(), 0);
}

// ── Custom model under the engine ─────────────────────────────────────

/// Generator feeding a server directly; loads that find it busy are lost.
struct LossShop {
    generator: Generator<u64>,
    server: Server<u64>,
    lost: Vec<u64>,
    departed: Vec<(u64, f64)>,
}

impl Model for LossShop {
    type Event = BenchEvent;

    fn initialize(&mut self, ctx: &mut RunContext<'_, BenchEvent>) -> SimResult<()> {
        self.server.initialize(ctx)?;
        self.generator.initialize(ctx)
    }

    fn execute(
        &mut self,
        ctx: &mut RunContext<'_, BenchEvent>,
        event: Event<BenchEvent>,
    ) -> SimResult<()> {
        match event.payload {
            BenchEvent::Gen(ev) => {
                for notice in self.generator.execute(ctx, ev)? {
                    let GeneratorNotice::LoadGenerated { load, .. } = notice;
                    if !self.server.try_start_service(load, ctx)? {
                        self.lost.push(load);
                    }
                }
            }
            BenchEvent::Server(ev) => {
                for notice in self.server.execute(ctx, ev)? {
                    if let ServerNotice::LoadDeparted { load, time, .. } = notice {
                        self.departed.push((load, time.value()));
                    }
                }
            }
            BenchEvent::Queue(_) => {
                return Err(SimError::InvalidArgument("loss shop has no queue".into()));
            }
        }
        Ok(())
    }
}

#[test]
fn test_loss_system_under_engine() {
    let mut ids = ComponentIdGen::new();
    let generator = Generator::builder(ids.next_id(), 5)
        .inter_arrival(constant(1.0))
        .load_factory(sequence(0))
        .build()
        .unwrap();
    let server = fixed_server(&mut ids, 1, 2.5);
    let shop = LossShop {
        generator,
        server,
        lost: Vec::new(),
        departed: Vec::new(),
    };

    let mut sim = Simulation::new(shop, DurationBound::new(SimTime::new(9.0)).unwrap());
    let report = sim.run().unwrap();
    assert_eq!(report.stop_reason, StopReason::StrategyHalted);
    assert_eq!(report.clock_time, SimTime::new(9.0));

    let shop = sim.into_model();
    assert_eq!(shop.departed, vec![(0, 2.5), (3, 5.5), (6, 8.5)]);
    assert_eq!(shop.lost, vec![1, 2, 4, 5, 7, 8]);
    // Load 9 arrived exactly at the bound and is still in service.
    assert_eq!(shop.server.service_start_time(&9), Some(SimTime::new(9.0)));
}
