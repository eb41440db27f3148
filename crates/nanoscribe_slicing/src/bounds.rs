//! # Primitive Bounds
//!
//! Structure-of-arrays storage for per-primitive height extents.
//!
//! ```text
//! Array of structs:   [min0 max0] [min1 max1] [min2 max2] ...
//! Structure of arrays: z_min: [min0 min1 min2 ...]
//!                      z_max: [max0 max1 max2 ...]
//! ```
//!
//! The filter loads eight consecutive `z_min` values into one register and
//! eight consecutive `z_max` values into another, so the columns must be
//! contiguous and separate.

use bytemuck::{Pod, Zeroable};

use crate::error::{ensure_same_len, SliceError, SliceResult};

/// Number of floats in one triangle of a flat vertex buffer.
pub const FLOATS_PER_TRIANGLE: usize = 9;

/// A triangle as three `[x, y, z]` vertices.
///
/// `#[repr(C)]` and `Pod`, so a flat `f32` vertex buffer can be viewed as
/// triangles without copying.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Triangle {
    /// The three vertices.
    pub vertices: [[f32; 3]; 3],
}

impl Triangle {
    /// Creates a triangle from three vertices.
    #[inline]
    #[must_use]
    pub const fn new(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Reinterprets a flat vertex buffer as triangles (zero copy).
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::MisalignedVertexBuffer`] when the buffer length
    /// is not a multiple of [`FLOATS_PER_TRIANGLE`].
    pub fn cast_slice(buffer: &[f32]) -> SliceResult<&[Self]> {
        bytemuck::try_cast_slice(buffer)
            .map_err(|_| SliceError::MisalignedVertexBuffer { len: buffer.len() })
    }

    /// Returns the `(z_min, z_max)` extent of this triangle.
    #[inline]
    #[must_use]
    pub fn z_bounds(&self) -> (f32, f32) {
        let [a, b, c] = self.vertices;
        (a[2].min(b[2]).min(c[2]), a[2].max(b[2]).max(c[2]))
    }
}

/// Owned bound columns, one `(z_min, z_max)` pair per primitive.
///
/// Both columns always have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundColumns {
    z_min: Vec<f32>,
    z_max: Vec<f32>,
}

impl BoundColumns {
    /// Creates empty columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty columns with room for `capacity` primitives.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            z_min: Vec::with_capacity(capacity),
            z_max: Vec::with_capacity(capacity),
        }
    }

    /// Takes ownership of two existing columns.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::LengthMismatch`] when the columns differ in length.
    pub fn from_columns(z_min: Vec<f32>, z_max: Vec<f32>) -> SliceResult<Self> {
        ensure_same_len(&z_min, &z_max)?;
        Ok(Self { z_min, z_max })
    }

    /// Builds columns from the z extents of each triangle.
    #[must_use]
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut columns = Self::with_capacity(triangles.len());
        for triangle in triangles {
            let (lo, hi) = triangle.z_bounds();
            columns.push(lo, hi);
        }
        columns
    }

    /// Builds columns straight from a flat `[x, y, z] * 3` vertex buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::MisalignedVertexBuffer`] if the buffer does not
    /// hold a whole number of triangles.
    pub fn from_vertex_buffer(buffer: &[f32]) -> SliceResult<Self> {
        Triangle::cast_slice(buffer).map(Self::from_triangles)
    }

    /// Appends one primitive.
    #[inline]
    pub fn push(&mut self, z_min: f32, z_max: f32) {
        self.z_min.push(z_min);
        self.z_max.push(z_max);
    }

    /// Removes all primitives, keeping the allocation.
    pub fn clear(&mut self) {
        self.z_min.clear();
        self.z_max.clear();
    }

    /// Number of primitives.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.z_min.len()
    }

    /// Returns true if there are no primitives.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z_min.is_empty()
    }

    /// The lower-bound column.
    #[inline]
    #[must_use]
    pub fn z_min(&self) -> &[f32] {
        &self.z_min
    }

    /// The upper-bound column.
    #[inline]
    #[must_use]
    pub fn z_max(&self) -> &[f32] {
        &self.z_max
    }
}

impl FromIterator<(f32, f32)> for BoundColumns {
    fn from_iter<I: IntoIterator<Item = (f32, f32)>>(iter: I) -> Self {
        let mut columns = Self::new();
        for (lo, hi) in iter {
            columns.push(lo, hi);
        }
        columns
    }
}
