//! # Slicing Error Types
//!
//! All errors that can occur while filtering primitives against a plane.

use thiserror::Error;

/// Errors that can occur in the slicing filter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SliceError {
    /// The two bound columns do not describe the same primitives.
    #[error("bound columns differ in length: z_min has {z_min}, z_max has {z_max}")]
    LengthMismatch {
        /// Length of the lower-bound column.
        z_min: usize,
        /// Length of the upper-bound column.
        z_max: usize,
    },

    /// A layer sweep was requested with an unusable layer height.
    #[error("invalid layer height: {0} (must be finite and positive)")]
    InvalidLayerHeight(f32),

    /// A flat vertex buffer did not hold a whole number of triangles.
    #[error("vertex buffer of {len} floats is not a whole number of triangles (9 floats each)")]
    MisalignedVertexBuffer {
        /// Number of floats in the buffer.
        len: usize,
    },
}

/// Result type for slicing operations.
pub type SliceResult<T> = Result<T, SliceError>;

/// Checks that both bound columns have the same length.
///
/// # Errors
///
/// Returns [`SliceError::LengthMismatch`] when they differ.
#[inline]
pub fn ensure_same_len(z_min: &[f32], z_max: &[f32]) -> SliceResult<usize> {
    if z_min.len() == z_max.len() {
        Ok(z_min.len())
    } else {
        Err(SliceError::LengthMismatch {
            z_min: z_min.len(),
            z_max: z_max.len(),
        })
    }
}
