//! # NANOSCRIBE Slicing Filter
//!
//! Counts how many primitives a horizontal slicing plane passes through.
//!
//! ## Architecture Rules
//!
//! 1. **Structure of arrays** - `z_min` and `z_max` are separate contiguous columns
//! 2. **No branches in the batch loop** - lanes compare into a bitmask, popcount sums it
//! 3. **No dropped primitives** - the tail past the last full batch goes through the scalar rule
//!
//! ## Example
//!
//! ```
//! use nanoscribe_slicing::{count_overlaps_scalar, count_overlaps_vectorized};
//!
//! let z_min = [0.0; 16];
//! let z_max = [5.0; 16];
//! assert_eq!(count_overlaps_vectorized(&z_min, &z_max, 2.5).unwrap(), 16);
//! assert_eq!(count_overlaps_scalar(&z_min, &z_max, 2.5).unwrap(), 16);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bounds;
pub mod error;
pub mod filter;
pub mod layers;
mod simd;

pub use bounds::{BoundColumns, Triangle, FLOATS_PER_TRIANGLE};
pub use error::{SliceError, SliceResult};
pub use filter::{
    count_overlaps_scalar, count_overlaps_vectorized, straddles, BatchWidth, FilterKernel,
    OverlapFilter,
};
pub use layers::LayerSpec;
