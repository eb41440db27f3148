//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so a file
//! only lists what it changes:
//!
//! ```toml
//! [filter]
//! batch_width = "lanes8"
//! kernel = "vectorized"
//!
//! [stress]
//! handoff_delay_us = 1
//! stall_timeout_ms = 2000
//! ```

use std::path::Path;
use std::time::Duration;

use nanoscribe_hardware::{AcquisitionProtocol, LockOrder};
use nanoscribe_slicing::{BatchWidth, FilterKernel};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Overlap filter settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Lanes per vector step.
    pub batch_width: BatchWidth,
    /// Kernel used by [`crate::Engine::count_overlaps`].
    pub kernel: FilterKernel,
}

/// Stress run and watchdog settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StressConfig {
    /// Pause between the two unordered acquisitions (microseconds).
    pub handoff_delay_us: u64,
    /// Time a stress run gets before the watchdog calls it stalled (ms).
    pub stall_timeout_ms: u64,
    /// Concurrent callers for an ordered stress run.
    pub safe_threads: usize,
    /// Cycles per ordered caller.
    pub safe_iterations: i64,
    /// Cycles per unordered caller.
    pub unsafe_iterations: i64,
    /// Repeated opposite-order trials when probing for the deadlock.
    pub deadlock_trials: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            handoff_delay_us: 1,
            stall_timeout_ms: 2_000,
            safe_threads: 4,
            safe_iterations: 100_000,
            unsafe_iterations: 1_000,
            deadlock_trials: 20,
        }
    }
}

impl StressConfig {
    /// Handoff delay as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn handoff_delay(&self) -> Duration {
        Duration::from_micros(self.handoff_delay_us)
    }

    /// Watchdog timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Overlap filter settings.
    pub filter: FilterConfig,
    /// Stress run settings.
    pub stress: StressConfig,
}

impl EngineConfig {
    /// Production config: heavier ordered runs, longer watchdog.
    ///
    /// The watchdog gets 10s so a loaded controller is not mistaken for a
    /// deadlocked one.
    #[must_use]
    pub fn production() -> Self {
        Self {
            filter: FilterConfig::default(),
            stress: StressConfig {
                handoff_delay_us: 1,
                stall_timeout_ms: 10_000,
                safe_threads: 8,
                safe_iterations: 1_000_000,
                unsafe_iterations: 1_000,
                deadlock_trials: 50,
            },
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] on syntax errors, unknown keys
    /// or out-of-range values.
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string(self).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for zero thread counts, zero
    /// timeouts or zero trials, and [`EngineError::Hardware`] for a handoff
    /// delay the coordinator rejects.
    pub fn validate(&self) -> EngineResult<()> {
        let stress = &self.stress;
        if stress.safe_threads == 0 {
            return Err(EngineError::InvalidConfig(
                "stress.safe_threads must be at least 1".to_string(),
            ));
        }
        if stress.stall_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "stress.stall_timeout_ms must be positive".to_string(),
            ));
        }
        if stress.deadlock_trials == 0 {
            return Err(EngineError::InvalidConfig(
                "stress.deadlock_trials must be at least 1".to_string(),
            ));
        }
        AcquisitionProtocol::unordered_with_delay(LockOrder::LaserFirst, stress.handoff_delay())?;
        Ok(())
    }
}
