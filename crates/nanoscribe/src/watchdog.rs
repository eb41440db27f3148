//! # Stress Watchdog
//!
//! Runs stress workers on their own threads and turns a hang into a value.
//!
//! ```text
//!   worker 0 ──┐
//!   worker 1 ──┼──> [completion channel] ──> harness: recv until deadline
//!   worker N ──┘
//!
//!   all reported before deadline -> Completed { elapsed }
//!   a worker unwound             -> Panicked { finished, panicked }
//!   otherwise                    -> Stalled { finished, stalled }
//! ```
//!
//! Stalled workers are abandoned, never joined. They keep their coordinator
//! alive until the process exits.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use nanoscribe_hardware::{AcquisitionProtocol, HardwareCoordinator, HardwareResult, LockOrder};
use tracing::{info, warn};

use crate::config::StressConfig;
use crate::error::EngineResult;

/// One stress worker: a protocol and how many cycles to run with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPlan {
    /// Acquisition protocol.
    pub protocol: AcquisitionProtocol,
    /// Cycles to run. Negative runs nothing.
    pub iterations: i64,
}

impl WorkerPlan {
    /// Ordered (deadlock-free) worker.
    #[must_use]
    pub const fn ordered(iterations: i64) -> Self {
        Self {
            protocol: AcquisitionProtocol::Ordered,
            iterations,
        }
    }

    /// Unordered worker with an explicit order and handoff delay.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error if the delay is out of range.
    pub fn unordered(order: LockOrder, handoff_delay: Duration, iterations: i64) -> HardwareResult<Self> {
        Ok(Self {
            protocol: AcquisitionProtocol::unordered_with_delay(order, handoff_delay)?,
            iterations,
        })
    }
}

/// How a watched stress run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StressOutcome {
    /// Every worker reported back before the deadline.
    Completed {
        /// Time until the last worker finished.
        elapsed: Duration,
    },
    /// At least one worker never reported back.
    Stalled {
        /// Workers that finished.
        finished: usize,
        /// Workers still blocked (abandoned).
        stalled: usize,
    },
    /// Some worker panicked. Nothing is blocked; every thread was joined.
    Panicked {
        /// Workers that finished.
        finished: usize,
        /// Workers that panicked.
        panicked: usize,
    },
}

impl StressOutcome {
    /// True if some worker was abandoned.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }

    /// True if some worker panicked instead of finishing.
    #[must_use]
    pub const fn is_panicked(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

/// Result of repeated opposite-order trials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrialReport {
    /// Trials run.
    pub trials: usize,
    /// Trials that stalled.
    pub stalled: usize,
    /// Index of the first stalled trial.
    pub first_stall: Option<usize>,
}

impl TrialReport {
    /// True if the hazard showed up at least once.
    #[must_use]
    pub const fn reproduced(&self) -> bool {
        self.stalled > 0
    }
}

/// Launches stress workers and watches them against a deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StressHarness {
    timeout: Duration,
}

impl StressHarness {
    /// Creates a harness that waits at most `timeout` per run.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Creates a harness with the configured stall timeout.
    #[must_use]
    pub const fn from_config(config: &StressConfig) -> Self {
        Self::new(config.stall_timeout())
    }

    /// The per-run deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one worker per plan against `hardware` and waits for them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Io`] if a worker thread cannot be spawned.
    pub fn run(
        &self,
        hardware: &Arc<HardwareCoordinator>,
        plans: &[WorkerPlan],
    ) -> EngineResult<StressOutcome> {
        let workers: Vec<_> = plans
            .iter()
            .copied()
            .map(|plan| {
                let hardware = Arc::clone(hardware);
                move || {
                    hardware.run(plan.protocol, plan.iterations);
                }
            })
            .collect();

        let outcome = self.watch(workers)?;
        if let StressOutcome::Completed { elapsed } = outcome {
            info!(
                workers = plans.len(),
                cycles = hardware.completed_cycles(),
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "stress run completed"
            );
        }
        Ok(outcome)
    }

    /// Spawns every worker and waits for their completion signals until the
    /// deadline.
    fn watch<F>(&self, workers: Vec<F>) -> EngineResult<StressOutcome>
    where
        F: FnOnce() + Send + 'static,
    {
        let total = workers.len();
        let (done_tx, done_rx) = crossbeam_channel::bounded(total);
        let start = Instant::now();
        let deadline = start + self.timeout;

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(total);
        for (index, work) in workers.into_iter().enumerate() {
            let done_tx = done_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("stress-{index}"))
                .spawn(move || {
                    work();
                    let _ = done_tx.send(index);
                })?;
            handles.push(handle);
        }
        drop(done_tx);

        let mut finished = 0;
        let mut disconnected = false;
        while finished < total {
            match done_rx.recv_deadline(deadline) {
                Ok(_) => finished += 1,
                Err(RecvTimeoutError::Timeout) => break,
                // Every sender is gone, so the silent workers unwound
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected {
            let panicked = handles
                .into_iter()
                .map(JoinHandle::join)
                .filter(Result::is_err)
                .count();
            warn!(finished, panicked, "stress workers panicked");
            return Ok(StressOutcome::Panicked { finished, panicked });
        }

        if finished < total {
            let stalled = total - finished;
            warn!(
                finished,
                stalled,
                timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                "stress run stalled, abandoning workers"
            );
            // Dropping the handles detaches the blocked threads
            drop(handles);
            return Ok(StressOutcome::Stalled { finished, stalled });
        }

        for handle in handles {
            let _ = handle.join();
        }
        Ok(StressOutcome::Completed {
            elapsed: start.elapsed(),
        })
    }

    /// Runs `threads` ordered workers of `iterations` cycles each.
    ///
    /// # Errors
    ///
    /// As [`StressHarness::run`].
    pub fn run_safe(
        &self,
        hardware: &Arc<HardwareCoordinator>,
        threads: usize,
        iterations: i64,
    ) -> EngineResult<StressOutcome> {
        self.run(hardware, &vec![WorkerPlan::ordered(iterations); threads])
    }

    /// Runs two unordered workers with opposite orders, the textbook
    /// circular wait.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Hardware`] for an out-of-range delay, or
    /// as [`StressHarness::run`].
    pub fn run_opposed(
        &self,
        hardware: &Arc<HardwareCoordinator>,
        iterations: i64,
        handoff_delay: Duration,
    ) -> EngineResult<StressOutcome> {
        let plans = [
            WorkerPlan::unordered(LockOrder::LaserFirst, handoff_delay, iterations)?,
            WorkerPlan::unordered(LockOrder::StageFirst, handoff_delay, iterations)?,
        ];
        self.run(hardware, &plans)
    }

    /// Repeats [`StressHarness::run_opposed`] on a fresh coordinator per trial.
    ///
    /// A stalled trial leaves its coordinator deadlocked; the next trial does
    /// not share it.
    ///
    /// # Errors
    ///
    /// As [`StressHarness::run_opposed`].
    pub fn deadlock_trials(
        &self,
        trials: usize,
        iterations: i64,
        handoff_delay: Duration,
    ) -> EngineResult<TrialReport> {
        let mut report = TrialReport {
            trials,
            ..TrialReport::default()
        };

        for trial in 0..trials {
            let hardware = Arc::new(HardwareCoordinator::new());
            if self.run_opposed(&hardware, iterations, handoff_delay)?.is_stalled() {
                report.stalled += 1;
                report.first_stall.get_or_insert(trial);
            }
        }

        info!(
            trials = report.trials,
            stalled = report.stalled,
            "deadlock trials finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(!StressOutcome::Completed { elapsed: Duration::ZERO }.is_stalled());
        assert!(StressOutcome::Stalled { finished: 1, stalled: 1 }.is_stalled());
        assert!(!TrialReport::default().reproduced());
    }

    #[test]
    fn test_empty_plan_completes() {
        let harness = StressHarness::new(Duration::from_millis(10));
        let hw = Arc::new(HardwareCoordinator::new());
        assert!(!harness.run(&hw, &[]).unwrap().is_stalled());
    }

    #[test]
    fn test_safe_workers_complete() {
        let harness = StressHarness::new(Duration::from_secs(30));
        let hw = Arc::new(HardwareCoordinator::new());
        let outcome = harness.run_safe(&hw, 4, 10_000).unwrap();
        assert!(!outcome.is_stalled());
        assert_eq!(hw.completed_cycles(), 40_000);
    }

    #[test]
    fn test_opposed_workers_stall() {
        let harness = StressHarness::new(Duration::from_secs(2));
        // 10 cycles x 20ms each finish in well under 2s unless deadlocked
        let report = harness
            .deadlock_trials(3, 10, Duration::from_millis(20))
            .unwrap();
        assert_eq!(report.trials, 3);
        assert!(report.reproduced(), "no trial deadlocked: {report:?}");
        assert!(report.first_stall.is_some());
    }

    #[test]
    fn test_panicking_worker_is_not_a_stall() {
        let harness = StressHarness::new(Duration::from_secs(5));
        let workers: Vec<Box<dyn FnOnce() + Send>> = vec![
            Box::new(|| {}),
            Box::new(|| panic!("worker failed")),
        ];

        let outcome = harness.watch(workers).unwrap();
        assert_eq!(outcome, StressOutcome::Panicked { finished: 1, panicked: 1 });
        assert!(!outcome.is_stalled());
        assert!(outcome.is_panicked());
    }

    #[test]
    fn test_unordered_plan_validates_delay() {
        assert!(WorkerPlan::unordered(LockOrder::LaserFirst, Duration::from_secs(5), 1).is_err());
    }
}
