//! # Layer Stacks
//!
//! Evenly spaced slicing planes: `first`, `first + height`, `first + 2*height`, ...

// Layer indices stay far below f32 mantissa range in practice
#![allow(clippy::cast_precision_loss)]

use crate::error::{SliceError, SliceResult};

/// A stack of evenly spaced slicing planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerSpec {
    first: f32,
    height: f32,
    count: usize,
}

impl LayerSpec {
    /// Creates a stack of `count` planes starting at `first`.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidLayerHeight`] if `height` is not finite
    /// and positive.
    pub fn new(first: f32, height: f32, count: usize) -> SliceResult<Self> {
        if !height.is_finite() || height <= 0.0 {
            return Err(SliceError::InvalidLayerHeight(height));
        }
        Ok(Self { first, height, count })
    }

    /// Height of the first plane.
    #[must_use]
    pub const fn first(&self) -> f32 {
        self.first
    }

    /// Distance between consecutive planes.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Number of planes.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Iterates the plane heights, bottom to top.
    pub fn planes(&self) -> impl Iterator<Item = f32> {
        let Self { first, height, count } = *self;
        (0..count).map(move |k| first + k as f32 * height)
    }
}
