//! # NANOSCRIBE Hardware Coordination
//!
//! Coordinates the laser actuator and the motion stage, two exclusive
//! resources that every exposure step needs at the same time.
//!
//! ## Lock Discipline
//!
//! 1. **One owner** - both locks live in a [`HardwareCoordinator`], never in globals
//! 2. **All or nothing** - the ordered protocol never waits while holding one resource
//! 3. **One guard** - both resources are handed out together as a [`JointGuard`]
//!
//! The unordered protocol breaks rule 2 on purpose. Two unordered callers using
//! opposite orders will deadlock; it exists to prove the ordered protocol does
//! not, even when it runs next to an unordered caller.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use nanoscribe_hardware::HardwareCoordinator;
//!
//! let hw = Arc::new(HardwareCoordinator::new());
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let hw = Arc::clone(&hw);
//!         thread::spawn(move || hw.run_safe(1_000))
//!     })
//!     .collect();
//! for w in workers {
//!     w.join().unwrap();
//! }
//! assert_eq!(hw.completed_cycles(), 4_000);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod coordinator;
pub mod error;
pub mod protocol;
pub mod resource;

pub use coordinator::{CoordinatorStats, HardwareCoordinator, JointGuard};
pub use error::{HardwareError, HardwareResult};
pub use protocol::{
    clamp_iterations, AcquisitionProtocol, LockOrder, DEFAULT_HANDOFF_DELAY, MAX_HANDOFF_DELAY,
};
pub use resource::{Laser, ResourceId, Stage};
