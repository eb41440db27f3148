//! # NANOSCRIBE Tech Demo
//!
//! Runs the engine end to end:
//! 1. Overlap filter, batched vs scalar, on 1M random triangles
//! 2. Ordered stress run from several threads
//! 3. Opposite-order unordered run, expected to deadlock
//!
//! Usage: `nanoscribe_demo [config.toml]`
//!
//! Exits with status 1 when the deadlock shows up.

use std::time::Instant;

use nanoscribe::{Engine, EngineConfig, EngineResult, StressOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Triangles in the filter benchmark.
const NUM_TRIANGLES: usize = 1_000_000;
/// Slice height for the benchmark.
const PLANE: f32 = 5.0;
/// Height of every benchmark triangle.
const THICKNESS: f32 = 0.1;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║     NANOSCRIBE TECH DEMO - BENCHMARK     ║");
    println!("╚══════════════════════════════════════════╝");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                std::process::exit(2);
            }
        },
        None => EngineConfig::default(),
    };

    match run(config) {
        Ok(true) => std::process::exit(1),
        Ok(false) => {}
        Err(e) => {
            eprintln!("Demo failed: {e}");
            std::process::exit(2);
        }
    }
}

/// Runs all phases. Returns true if the deadlock was observed.
fn run(config: EngineConfig) -> EngineResult<bool> {
    let engine = Engine::new(config)?;

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let z_min: Vec<f32> = (0..NUM_TRIANGLES)
        .map(|_| rng.gen_range(0.0f32..10.0))
        .collect();
    let z_max: Vec<f32> = z_min.iter().map(|&z| z + THICKNESS).collect();

    println!("--- Phase 1: Batched Filter ---");
    let start = Instant::now();
    let hits = engine.count_overlaps_vectorized(&z_min, &z_max, PLANE)?;
    println!(
        "Processed {NUM_TRIANGLES} triangles in {:.2}ms ({} lanes)",
        start.elapsed().as_secs_f64() * 1000.0,
        engine.config().filter.batch_width.lanes()
    );
    println!("Intersections found: {hits}");

    println!();
    println!("--- Phase 1b: Scalar Comparison ---");
    let start = Instant::now();
    let scalar_hits = engine.count_overlaps_scalar(&z_min, &z_max, PLANE)?;
    println!(
        "Processed {NUM_TRIANGLES} triangles in {:.2}ms (Scalar)",
        start.elapsed().as_secs_f64() * 1000.0
    );
    println!("Intersections found: {scalar_hits}");
    if scalar_hits != hits {
        println!("!!! KERNEL MISMATCH: batched {hits} vs scalar {scalar_hits} !!!");
    }

    let stress = &engine.config().stress;
    let harness = engine.harness();

    println!();
    println!("--- Phase 2: Ordered Stress Run ---");
    match harness.run_safe(engine.hardware(), stress.safe_threads, stress.safe_iterations)? {
        StressOutcome::Completed { elapsed } => println!(
            "Stability check passed: {} lock cycles in {:.2}s without deadlock.",
            engine.hardware().completed_cycles(),
            elapsed.as_secs_f64()
        ),
        StressOutcome::Stalled { stalled, .. } => {
            println!("!!! ORDERED RUN STALLED: {stalled} workers blocked !!!");
            return Ok(true);
        }
        StressOutcome::Panicked { panicked, .. } => {
            eprintln!("Ordered run failed: {panicked} workers panicked");
            std::process::exit(2);
        }
    }

    println!();
    println!("--- Phase 2b: Unordered Comparison ---");
    println!("Attempting unordered locking with circular wait...");
    let outcome = harness.run_opposed(
        engine.hardware(),
        stress.unsafe_iterations,
        engine.handoff_delay(),
    )?;

    if outcome.is_stalled() {
        println!("!!! DEADLOCK DETECTED !!!");
        println!(
            "Workers failed to complete within {:.1} seconds.",
            harness.timeout().as_secs_f64()
        );
        println!("All-or-nothing acquisition is what keeps the ordered run alive.");
        return Ok(true);
    }
    if let StressOutcome::Panicked { panicked, .. } = outcome {
        eprintln!("Unordered run failed: {panicked} workers panicked");
        std::process::exit(2);
    }

    println!("Unordered run finished without deadlock (lucky timing or insufficient load).");
    Ok(false)
}
