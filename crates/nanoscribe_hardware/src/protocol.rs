//! # Acquisition Protocols
//!
//! How a caller takes the laser and the stage together.
//!
//! ```text
//! Ordered:    lock(laser, stage) as one step, back off instead of waiting half-held
//!             -> no circular wait, no deadlock
//!
//! Unordered:  Thread A: lock(laser) .. delay .. lock(stage)
//!             Thread B: lock(stage) .. delay .. lock(laser)
//!             -> A holds laser waiting for stage,
//!                B holds stage waiting for laser: DEADLOCK
//! ```
//!
//! The unordered protocol is the negative control. It is never fixed.

use std::time::Duration;

use crate::error::{HardwareError, HardwareResult};

/// Default pause between the two acquisitions of the unordered protocol.
pub const DEFAULT_HANDOFF_DELAY: Duration = Duration::from_micros(1);

/// Longest accepted pause between the two unordered acquisitions.
pub const MAX_HANDOFF_DELAY: Duration = Duration::from_secs(1);

/// Order of the two separate acquisitions in the unordered protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockOrder {
    /// Laser, then stage.
    LaserFirst,
    /// Stage, then laser.
    StageFirst,
}

impl LockOrder {
    /// Maps the host's `reverse_order` flag: false is laser first.
    #[inline]
    #[must_use]
    pub const fn from_reverse(reverse_order: bool) -> Self {
        if reverse_order {
            Self::StageFirst
        } else {
            Self::LaserFirst
        }
    }

    /// The order that closes a circular wait against this one.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::LaserFirst => Self::StageFirst,
            Self::StageFirst => Self::LaserFirst,
        }
    }
}

/// Which acquisition discipline a stress run uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionProtocol {
    /// Both resources granted together as one guard, all or nothing.
    Ordered,
    /// Two independent acquisitions with a pause between them.
    Unordered {
        /// Which resource is taken first.
        order: LockOrder,
        /// Pause while holding only the first resource.
        handoff_delay: Duration,
    },
}

impl AcquisitionProtocol {
    /// Unordered protocol with the default handoff delay.
    #[must_use]
    pub const fn unordered(reverse_order: bool) -> Self {
        Self::Unordered {
            order: LockOrder::from_reverse(reverse_order),
            handoff_delay: DEFAULT_HANDOFF_DELAY,
        }
    }

    /// Unordered protocol with a custom handoff delay.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::HandoffDelayTooLong`] if the delay exceeds
    /// [`MAX_HANDOFF_DELAY`].
    pub fn unordered_with_delay(order: LockOrder, handoff_delay: Duration) -> HardwareResult<Self> {
        if handoff_delay > MAX_HANDOFF_DELAY {
            return Err(HardwareError::HandoffDelayTooLong {
                requested_us: u64::try_from(handoff_delay.as_micros()).unwrap_or(u64::MAX),
                max_us: u64::try_from(MAX_HANDOFF_DELAY.as_micros()).unwrap_or(u64::MAX),
            });
        }
        Ok(Self::Unordered { order, handoff_delay })
    }

    /// True for protocols that can never close a circular wait among
    /// callers using the same protocol.
    #[must_use]
    pub const fn is_deadlock_free(&self) -> bool {
        matches!(self, Self::Ordered)
    }
}

/// Converts a host iteration count; negative counts run nothing.
#[inline]
#[must_use]
pub fn clamp_iterations(iterations: i64) -> u64 {
    u64::try_from(iterations).unwrap_or(0)
}
