//! # Hardware Error Types
//!
//! Errors raised while configuring acquisition protocols.
//!
//! The protocols themselves never fail: a circular wait in the unordered
//! protocol is a hang, observed from outside, not an error value.

use thiserror::Error;

/// Errors that can occur while configuring the coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// The injected handoff delay would stall every single cycle.
    #[error("handoff delay {requested_us}us exceeds the {max_us}us limit")]
    HandoffDelayTooLong {
        /// Requested delay in microseconds.
        requested_us: u64,
        /// Largest accepted delay in microseconds.
        max_us: u64,
    },
}

/// Result type for hardware coordination.
pub type HardwareResult<T> = Result<T, HardwareError>;
