use kairos::component::sampling::{exponential, sequence};
use kairos::{
    ComponentIdGen, Generator, Pipeline, Queue, RunConfig, Server, SimResult, Simulation,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SEED: u64 = 42;

fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("═══════════════════════════════════════════════════════");
    println!("  Kairos: Deterministic Discrete-Event Simulation");
    println!("  M/M/1/10 pipeline with warm-up + replay check");
    println!("═══════════════════════════════════════════════════════");
    println!();

    let config = RunConfig::Duration {
        end_time: 10_000.0,
        warmup_end_time: Some(1_000.0),
    };

    // ── Run 1 ─────────────────────────────────────────────────
    let digest_1 = run_pipeline("Run 1", config)?;

    // ── Run 2: same seeds, same configuration ─────────────────
    let digest_2 = run_pipeline("Run 2", config)?;

    // ── Verify ────────────────────────────────────────────────
    println!("  Verification:");
    println!("    Run 1 trace digest: {:016x}", digest_1);
    println!("    Run 2 trace digest: {:016x}", digest_2);
    if digest_1 == digest_2 {
        println!("    ✓ Traces are identical, deterministic replay confirmed.");
    } else {
        println!("    ✗ Trace mismatch, determinism violation detected!");
    }
    Ok(())
}

fn run_pipeline(label: &str, config: RunConfig) -> SimResult<u64> {
    let mut ids = ComponentIdGen::new();
    let generator = Generator::builder(ids.next_id(), SEED)
        .inter_arrival(exponential(1.0)?)
        .load_factory(sequence(1))
        .build()?;
    let queue = Queue::builder(ids.next_id()).capacity(10).build()?;
    let server = Server::builder(ids.next_id(), SEED + 1)
        .service_time_sampler(exponential(0.8)?)
        .build()?;

    let mut sim = Simulation::new(
        Pipeline::new(generator, queue, server),
        config.into_strategy::<Pipeline<u64>>()?,
    );
    sim.enable_trace();
    let report = sim.run()?;
    info!(run = label, reason = ?report.stop_reason, "Run finished");

    let pipeline = sim.model();
    let stats = pipeline.stats();
    let now = report.clock_time;
    println!(
        "  {}: {} events, stopped at {} ({:?})",
        label, report.executed_event_count, now, report.stop_reason
    );
    println!(
        "    after warm-up: {} generated, {} balked, {} departed",
        stats.generated, stats.balked, stats.departed
    );
    println!(
        "    mean service {:.3}, server utilization {:.3}, mean queue length {:.3}",
        stats.mean_service_time().unwrap_or(0.0),
        pipeline.server().utilization(now),
        pipeline.queue().occupancy_counter().average_count(now)
    );
    println!();

    Ok(sim.trace().map_or(0, |t| t.digest()))
}
