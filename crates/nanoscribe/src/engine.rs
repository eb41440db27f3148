//! # Engine Facade
//!
//! The four operations the host control layer calls, on one shared value.

use std::sync::Arc;
use std::time::Duration;

use nanoscribe_hardware::{AcquisitionProtocol, HardwareCoordinator, LockOrder};
use nanoscribe_slicing::{FilterKernel, LayerSpec, OverlapFilter};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::watchdog::StressHarness;

/// Slicing filter plus laser/stage coordinator.
///
/// `Send + Sync`: share one engine across host threads; every operation
/// takes `&self`.
///
/// # Example
///
/// ```
/// use nanoscribe::Engine;
///
/// let engine = Engine::default();
/// assert_eq!(engine.count_overlaps_vectorized(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], 1.5).unwrap(), 1);
/// engine.run_safe_stress(1_000);
/// assert_eq!(engine.hardware().completed_cycles(), 1_000);
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    scalar: OverlapFilter,
    vectorized: OverlapFilter,
    hardware: Arc<HardwareCoordinator>,
}

impl Engine {
    /// Builds an engine from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `config` is out of range.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    /// `config` must already pass [`EngineConfig::validate`].
    fn with_valid_config(config: EngineConfig) -> Self {
        let width = config.filter.batch_width;
        Self {
            scalar: OverlapFilter::new(width, FilterKernel::Scalar),
            vectorized: OverlapFilter::new(width, FilterKernel::Vectorized),
            hardware: Arc::new(HardwareCoordinator::new()),
            config,
        }
    }

    /// Counts straddling primitives with the batched kernel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Slice`] if the columns differ in length.
    pub fn count_overlaps_vectorized(
        &self,
        z_min: &[f32],
        z_max: &[f32],
        plane: f32,
    ) -> EngineResult<usize> {
        Ok(self.vectorized.count(z_min, z_max, plane)?)
    }

    /// Counts straddling primitives with the scalar kernel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Slice`] if the columns differ in length.
    pub fn count_overlaps_scalar(
        &self,
        z_min: &[f32],
        z_max: &[f32],
        plane: f32,
    ) -> EngineResult<usize> {
        Ok(self.scalar.count(z_min, z_max, plane)?)
    }

    /// Counts straddling primitives with the configured kernel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Slice`] if the columns differ in length.
    pub fn count_overlaps(&self, z_min: &[f32], z_max: &[f32], plane: f32) -> EngineResult<usize> {
        Ok(self.configured_filter().count(z_min, z_max, plane)?)
    }

    /// Per-layer straddle counts for a whole layer stack, configured kernel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Slice`] if the columns differ in length.
    pub fn count_layers(
        &self,
        z_min: &[f32],
        z_max: &[f32],
        layers: &LayerSpec,
    ) -> EngineResult<Vec<usize>> {
        Ok(self.configured_filter().count_layers(z_min, z_max, layers)?)
    }

    fn configured_filter(&self) -> &OverlapFilter {
        match self.config.filter.kernel {
            FilterKernel::Scalar => &self.scalar,
            FilterKernel::Vectorized => &self.vectorized,
        }
    }

    /// Ordered stress run on the calling thread. Never deadlocks against
    /// other ordered callers.
    pub fn run_safe_stress(&self, iterations: i64) {
        self.hardware.run_safe(iterations);
    }

    /// Unordered stress run on the calling thread, using the configured
    /// handoff delay.
    ///
    /// Against a concurrent caller with the opposite `reverse_order` this
    /// blocks forever. Run it where the thread can be abandoned.
    pub fn run_unsafe_stress(&self, iterations: i64, reverse_order: bool) {
        let protocol = AcquisitionProtocol::Unordered {
            order: LockOrder::from_reverse(reverse_order),
            handoff_delay: self.handoff_delay(),
        };
        self.hardware.run(protocol, iterations);
    }

    /// The shared coordinator, for callers that spawn their own workers.
    #[must_use]
    pub fn hardware(&self) -> &Arc<HardwareCoordinator> {
        &self.hardware
    }

    /// A watchdog using the configured stall timeout.
    #[must_use]
    pub fn harness(&self) -> StressHarness {
        StressHarness::from_config(&self.config.stress)
    }

    /// The configuration this engine was built from.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Configured pause between unordered acquisitions.
    #[must_use]
    pub fn handoff_delay(&self) -> Duration {
        self.config.stress.handoff_delay()
    }
}

impl Default for Engine {
    fn default() -> Self {
        // Defaults are covered by the config's own validation tests
        Self::with_valid_config(EngineConfig::default())
    }
}
