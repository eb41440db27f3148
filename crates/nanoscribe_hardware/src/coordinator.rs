//! # Dual-Resource Coordinator
//!
//! Owns the laser and stage locks and runs repeated critical sections that
//! need both.
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │      HardwareCoordinator     │
//!            │                              │
//!            │  ┌──────────┐  ┌──────────┐  │
//!            │  │  laser   │  │  stage   │  │
//!            │  │ (rank 0) │  │ (rank 1) │  │
//!            │  └──────────┘  └──────────┘  │
//!            └──────────────┬───────────────┘
//!                 ┌─────────┴─────────┐
//!                 ▼                   ▼
//!          acquire_both()      run(Unordered { .. })
//!         (JointGuard, safe)   (two locks, hazard)
//! ```
//!
//! The locks are fields, not process globals. Share a coordinator by
//! reference or `Arc`; a coordinator left deadlocked by the unordered
//! protocol is simply abandoned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::protocol::{clamp_iterations, AcquisitionProtocol, LockOrder};
use crate::resource::{Laser, ResourceId, Stage};

/// Both resources held at once, released together on drop.
///
/// Only [`HardwareCoordinator::acquire_both`] creates one.
pub struct JointGuard<'a> {
    // Field order fixes drop order: laser released before stage
    laser: MutexGuard<'a, Laser>,
    stage: MutexGuard<'a, Stage>,
}

impl JointGuard<'_> {
    /// The held laser.
    #[inline]
    pub fn laser(&mut self) -> &mut Laser {
        &mut self.laser
    }

    /// The held stage.
    #[inline]
    pub fn stage(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Runs the joint critical section.
    #[inline]
    fn expose(&mut self) {
        critical_section(&mut self.laser, &mut self.stage);
    }
}

/// Counters reported by [`HardwareCoordinator::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Completed critical sections, all callers and protocols.
    pub cycles: u64,
    /// Laser pulses fired.
    pub laser_pulses: u64,
    /// Stage steps taken.
    pub stage_moves: u64,
}

/// Owner of the laser/stage lock pair.
///
/// `Send + Sync`; every method takes `&self`. Protocols never spawn threads,
/// the caller decides how many run concurrently.
#[derive(Debug, Default)]
pub struct HardwareCoordinator {
    laser: Mutex<Laser>,
    stage: Mutex<Stage>,
    cycles: AtomicU64,
}

impl HardwareCoordinator {
    /// Creates a coordinator with both resources free.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires both resources as one step and returns them as one guard.
    ///
    /// Blocks on one resource, then only tries the other. If that try fails
    /// the first is released and the next round blocks on the one that was
    /// busy. A caller never waits while holding a resource, so no mix of
    /// callers (ordered or unordered) can close a cycle through this method.
    /// Blocks without timeout.
    #[must_use]
    pub fn acquire_both(&self) -> JointGuard<'_> {
        let mut first = ResourceId::Laser;
        loop {
            match first {
                ResourceId::Laser => {
                    let laser = self.laser.lock();
                    if let Some(stage) = self.stage.try_lock() {
                        return JointGuard { laser, stage };
                    }
                    drop(laser);
                    first = ResourceId::Stage;
                }
                ResourceId::Stage => {
                    let stage = self.stage.lock();
                    if let Some(laser) = self.laser.try_lock() {
                        return JointGuard { laser, stage };
                    }
                    drop(stage);
                    first = ResourceId::Laser;
                }
            }
            thread::yield_now();
        }
    }

    /// Runs `iterations` joint critical sections with the given protocol.
    ///
    /// Negative `iterations` run nothing. Returns the number of cycles this
    /// call completed.
    ///
    /// With [`AcquisitionProtocol::Unordered`] and another caller using the
    /// opposite order, this call can block forever. That is the point of the
    /// unordered protocol; the caller must be able to abandon the thread.
    pub fn run(&self, protocol: AcquisitionProtocol, iterations: i64) -> u64 {
        let iterations = clamp_iterations(iterations);
        debug!(?protocol, iterations, "stress run starting");
        let start = Instant::now();

        for _ in 0..iterations {
            match protocol {
                AcquisitionProtocol::Ordered => self.acquire_both().expose(),
                AcquisitionProtocol::Unordered { order, handoff_delay } => {
                    self.unordered_cycle(order, handoff_delay);
                }
            }
            self.cycles.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            ?protocol,
            iterations,
            elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "stress run finished"
        );
        iterations
    }

    /// Ordered protocol: each iteration takes both resources as one step.
    ///
    /// Never deadlocks, also not against concurrent unordered callers.
    pub fn run_safe(&self, iterations: i64) -> u64 {
        self.run(AcquisitionProtocol::Ordered, iterations)
    }

    /// Unordered protocol: laser then stage, or stage then laser when
    /// `reverse_order` is set, with the default handoff delay in between.
    ///
    /// Deadlock-prone against a concurrent caller using the other order.
    pub fn run_unsafe(&self, iterations: i64, reverse_order: bool) -> u64 {
        self.run(AcquisitionProtocol::unordered(reverse_order), iterations)
    }

    /// Critical sections completed so far.
    #[inline]
    #[must_use]
    pub fn completed_cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Snapshot of all counters.
    ///
    /// Takes both resources through the ordered path, so it blocks while a
    /// critical section is running and forever on a deadlocked coordinator.
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        let mut guard = self.acquire_both();
        CoordinatorStats {
            cycles: self.completed_cycles(),
            laser_pulses: guard.laser().pulses(),
            stage_moves: guard.stage().moves(),
        }
    }

    /// True if some thread holds the laser right now.
    #[inline]
    #[must_use]
    pub fn is_laser_held(&self) -> bool {
        self.laser.is_locked()
    }

    /// True if some thread holds the stage right now.
    #[inline]
    #[must_use]
    pub fn is_stage_held(&self) -> bool {
        self.stage.is_locked()
    }

    /// Two separate acquisitions, pausing while only the first is held.
    fn unordered_cycle(&self, order: LockOrder, handoff_delay: Duration) {
        match order {
            LockOrder::LaserFirst => {
                let mut laser = self.laser.lock();
                handoff_pause(handoff_delay);
                let mut stage = self.stage.lock();
                critical_section(&mut laser, &mut stage);
            }
            LockOrder::StageFirst => {
                let mut stage = self.stage.lock();
                handoff_pause(handoff_delay);
                let mut laser = self.laser.lock();
                critical_section(&mut laser, &mut stage);
            }
        }
    }
}

/// Stand-in for one exposure step: fire, move, give up the time slice.
#[inline]
fn critical_section(laser: &mut Laser, stage: &mut Stage) {
    laser.fire();
    stage.step();
    thread::yield_now();
}

/// Widens the race window between the two unordered acquisitions.
#[inline]
fn handoff_pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
