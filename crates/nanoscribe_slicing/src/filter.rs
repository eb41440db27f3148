//! # Plane Overlap Filter
//!
//! Counts primitives whose `[z_min, z_max]` extent contains the slicing plane.
//!
//! ## Kernels
//!
//! ```text
//! Scalar:      for each i: z_min[i] <= plane && z_max[i] >= plane
//!
//! Vectorized:  for each batch of N lanes:
//!                mask  = (z_min[b..b+N] <= plane) & (z_max[b..b+N] >= plane)
//!                count += popcount(mask)
//!              remainder (len % N) -> scalar rule
//! ```
//!
//! Both kernels return identical counts for every input. The scalar kernel is
//! the oracle; the vectorized kernel exists for throughput.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bounds::BoundColumns;
use crate::error::{ensure_same_len, SliceResult};
use crate::layers::LayerSpec;
use crate::simd;

/// Number of lanes evaluated per vector step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchWidth {
    /// 128-bit register (SSE / NEON).
    Lanes4,
    /// 256-bit register (AVX). Runs on intrinsics when the CPU has AVX.
    #[default]
    Lanes8,
    /// 512-bit register width, evaluated portably.
    Lanes16,
}

impl BatchWidth {
    /// Lane count of this width.
    #[inline]
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Self::Lanes4 => 4,
            Self::Lanes8 => 8,
            Self::Lanes16 => 16,
        }
    }

    /// All supported widths.
    pub const ALL: [Self; 3] = [Self::Lanes4, Self::Lanes8, Self::Lanes16];
}

/// Which counting kernel a filter runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKernel {
    /// Per-element evaluation.
    Scalar,
    /// Batched lane-mask evaluation.
    #[default]
    Vectorized,
}

/// Returns true if a primitive with extent `[z_min, z_max]` touches `plane`.
///
/// Inclusive on both sides. NaN never straddles.
#[inline(always)]
#[must_use]
pub fn straddles(z_min: f32, z_max: f32, plane: f32) -> bool {
    // Non-short-circuit AND keeps this branch-free
    (z_min <= plane) & (z_max >= plane)
}

/// Counts straddling primitives one element at a time.
///
/// # Errors
///
/// Returns [`crate::SliceError::LengthMismatch`] if the columns differ in length.
pub fn count_overlaps_scalar(z_min: &[f32], z_max: &[f32], plane: f32) -> SliceResult<usize> {
    ensure_same_len(z_min, z_max)?;
    Ok(count_scalar_unchecked(z_min, z_max, plane))
}

/// Counts straddling primitives in 8-lane batches.
///
/// Elements past the last full batch are counted with the scalar rule.
///
/// # Errors
///
/// Returns [`crate::SliceError::LengthMismatch`] if the columns differ in length.
pub fn count_overlaps_vectorized(z_min: &[f32], z_max: &[f32], plane: f32) -> SliceResult<usize> {
    ensure_same_len(z_min, z_max)?;
    Ok(count_vectorized_unchecked(BatchWidth::Lanes8, z_min, z_max, plane))
}

/// Scalar kernel over columns already known to be the same length.
#[inline]
pub(crate) fn count_scalar_unchecked(z_min: &[f32], z_max: &[f32], plane: f32) -> usize {
    z_min
        .iter()
        .zip(z_max)
        .filter(|&(&lo, &hi)| straddles(lo, hi, plane))
        .count()
}

fn count_vectorized_unchecked(width: BatchWidth, z_min: &[f32], z_max: &[f32], plane: f32) -> usize {
    match width {
        BatchWidth::Lanes4 => count_batched::<4>(z_min, z_max, plane),
        BatchWidth::Lanes8 => simd::count_avx(z_min, z_max, plane)
            .unwrap_or_else(|| count_batched::<8>(z_min, z_max, plane)),
        BatchWidth::Lanes16 => count_batched::<16>(z_min, z_max, plane),
    }
}

/// Portable lane kernel: full batches build a bitmask, the tail goes scalar.
#[inline]
fn count_batched<const LANES: usize>(z_min: &[f32], z_max: &[f32], plane: f32) -> usize {
    let min_batches = z_min.chunks_exact(LANES);
    let max_batches = z_max.chunks_exact(LANES);
    let tail_min = min_batches.remainder();
    let tail_max = max_batches.remainder();

    let mut count = 0usize;
    for (lo, hi) in min_batches.zip(max_batches) {
        count += lane_mask(lo, hi, plane).count_ones() as usize;
    }

    count + count_scalar_unchecked(tail_min, tail_max, plane)
}

/// One bit per lane, set where the lane straddles the plane.
#[inline(always)]
fn lane_mask(lo: &[f32], hi: &[f32], plane: f32) -> u32 {
    lo.iter()
        .zip(hi)
        .enumerate()
        .fold(0u32, |mask, (lane, (&a, &b))| {
            mask | (u32::from(straddles(a, b, plane)) << lane)
        })
}

/// A configured overlap filter.
///
/// Stateless apart from its configuration; share freely across threads.
///
/// # Example
///
/// ```
/// use nanoscribe_slicing::{BatchWidth, FilterKernel, OverlapFilter};
///
/// let filter = OverlapFilter::new(BatchWidth::Lanes8, FilterKernel::Vectorized);
/// let hits = filter.count(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], 1.5).unwrap();
/// assert_eq!(hits, 1);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlapFilter {
    width: BatchWidth,
    kernel: FilterKernel,
}

impl OverlapFilter {
    /// Creates a filter with the given batch width and kernel.
    #[must_use]
    pub fn new(width: BatchWidth, kernel: FilterKernel) -> Self {
        debug!(
            lanes = width.lanes(),
            kernel = ?kernel,
            avx = simd::avx_available(),
            "overlap filter configured"
        );
        Self { width, kernel }
    }

    /// The batch width used by the vectorized kernel.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> BatchWidth {
        self.width
    }

    /// The kernel this filter runs.
    #[inline]
    #[must_use]
    pub const fn kernel(&self) -> FilterKernel {
        self.kernel
    }

    /// Counts primitives straddling `plane`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SliceError::LengthMismatch`] if the columns differ in length.
    pub fn count(&self, z_min: &[f32], z_max: &[f32], plane: f32) -> SliceResult<usize> {
        ensure_same_len(z_min, z_max)?;
        Ok(self.count_unchecked(z_min, z_max, plane))
    }

    /// Counts primitives in owned columns straddling `plane`.
    #[must_use]
    pub fn count_columns(&self, columns: &BoundColumns, plane: f32) -> usize {
        self.count_unchecked(columns.z_min(), columns.z_max(), plane)
    }

    /// Counts straddling primitives for every plane of a layer stack.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SliceError::LengthMismatch`] if the columns differ in length.
    pub fn count_layers(
        &self,
        z_min: &[f32],
        z_max: &[f32],
        layers: &LayerSpec,
    ) -> SliceResult<Vec<usize>> {
        ensure_same_len(z_min, z_max)?;
        Ok(layers
            .planes()
            .map(|plane| self.count_unchecked(z_min, z_max, plane))
            .collect())
    }

    #[inline]
    fn count_unchecked(&self, z_min: &[f32], z_max: &[f32], plane: f32) -> usize {
        match self.kernel {
            FilterKernel::Scalar => count_scalar_unchecked(z_min, z_max, plane),
            FilterKernel::Vectorized => count_vectorized_unchecked(self.width, z_min, z_max, plane),
        }
    }
}
