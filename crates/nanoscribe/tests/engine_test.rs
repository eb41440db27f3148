//! # Engine Integration Test
//!
//! Drives the four host operations the way the control layer does: shared
//! engine, many threads, watchdog around anything that can hang.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nanoscribe::{Engine, EngineConfig, EngineError, StressHarness, StressOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_columns(rng: &mut StdRng, len: usize) -> (Vec<f32>, Vec<f32>) {
    let z_min: Vec<f32> = (0..len).map(|_| rng.gen_range(0.0f32..10.0)).collect();
    let z_max: Vec<f32> = z_min.iter().map(|&z| z + rng.gen_range(0.0f32..1.0)).collect();
    (z_min, z_max)
}

#[test]
fn test_kernels_agree_through_engine() {
    let engine = Engine::default();
    let mut rng = StdRng::seed_from_u64(7);

    for len in [0, 1, 7, 8, 9, 17, 1_000, 4_099] {
        let (z_min, z_max) = random_columns(&mut rng, len);
        for _ in 0..8 {
            let plane: f32 = rng.gen_range(-1.0f32..12.0);
            assert_eq!(
                engine.count_overlaps_vectorized(&z_min, &z_max, plane).unwrap(),
                engine.count_overlaps_scalar(&z_min, &z_max, plane).unwrap(),
                "len={len} plane={plane}"
            );
        }
    }
}

#[test]
fn test_host_examples() {
    let engine = Engine::default();
    assert_eq!(engine.count_overlaps_vectorized(&[], &[], 0.0).unwrap(), 0);
    assert_eq!(
        engine.count_overlaps_scalar(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], 1.0).unwrap(),
        2
    );
    assert_eq!(
        engine.count_overlaps_vectorized(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], 5.0).unwrap(),
        0
    );
}

#[test]
fn test_length_mismatch_is_rejected_by_both_kernels() {
    let engine = Engine::default();
    assert!(matches!(
        engine.count_overlaps_vectorized(&[0.0; 9], &[1.0; 8], 0.5),
        Err(EngineError::Slice(_))
    ));
    assert!(matches!(
        engine.count_overlaps_scalar(&[0.0; 9], &[1.0; 8], 0.5),
        Err(EngineError::Slice(_))
    ));
}

#[test]
fn test_concurrent_safe_stress_from_host_threads() {
    let engine = Arc::new(Engine::default());
    let (tx, rx) = crossbeam_channel::unbounded();

    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let tx = tx.clone();
        thread::spawn(move || {
            engine.run_safe_stress(100_000);
            let _ = tx.send(());
        });
    }
    drop(tx);

    let deadline = Instant::now() + Duration::from_secs(60);
    for _ in 0..4 {
        assert!(rx.recv_deadline(deadline).is_ok(), "ordered stress run hung");
    }
    assert_eq!(engine.hardware().completed_cycles(), 400_000);
}

#[test]
fn test_harness_safe_run_completes() {
    let engine = Engine::default();
    let harness = StressHarness::new(Duration::from_secs(60));
    let outcome = harness.run_safe(engine.hardware(), 8, 10_000).unwrap();

    assert!(matches!(outcome, StressOutcome::Completed { .. }));
    let stats = engine.hardware().stats();
    assert_eq!(stats.cycles, 80_000);
    assert_eq!(stats.laser_pulses, 80_000);
    assert_eq!(stats.stage_moves, 80_000);
}

#[test]
fn test_opposite_unsafe_runs_deadlock() {
    let config = EngineConfig::from_toml_str(
        r"
        [stress]
        handoff_delay_us = 20000
        stall_timeout_ms = 2000
        ",
    )
    .unwrap();

    // Fresh engine per trial: a deadlocked one is abandoned with its threads
    let stalled = (0..10).any(|_| {
        let engine = Arc::new(Engine::new(config.clone()).unwrap());
        let (tx, rx) = crossbeam_channel::unbounded();
        for reverse in [false, true] {
            let engine = Arc::clone(&engine);
            let tx = tx.clone();
            thread::spawn(move || {
                // 20 cycles x 20ms finish well inside 2s unless deadlocked
                engine.run_unsafe_stress(20, reverse);
                let _ = tx.send(());
            });
        }
        drop(tx);

        let deadline = Instant::now() + engine.config().stress.stall_timeout();
        !(0..2).all(|_| rx.recv_deadline(deadline).is_ok())
    });

    assert!(stalled, "opposite lock orders never deadlocked");
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("nanoscribe-{}.toml", std::process::id()));
    let config = EngineConfig::production();
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

    let loaded = EngineConfig::from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, config);
    assert!(Engine::new(loaded).is_ok());
}
