//! # AVX Overlap Kernel
//!
//! Eight-lane single-precision path for x86_64.
//!
//! ## Safety Note
//!
//! Intrinsics require unsafe code. The only entry point, [`count_avx`],
//! checks for AVX at runtime before touching the `target_feature` function.

#![allow(unsafe_code)]

/// Lanes in one 256-bit single-precision register.
#[cfg(target_arch = "x86_64")]
pub(crate) const AVX_LANES: usize = 8;

/// Returns true if the running CPU can execute the AVX kernel.
#[cfg(target_arch = "x86_64")]
#[inline]
pub(crate) fn avx_available() -> bool {
    std::arch::is_x86_feature_detected!("avx")
}

/// Returns true if the running CPU can execute the AVX kernel.
#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub(crate) fn avx_available() -> bool {
    false
}

/// Counts straddling primitives with AVX, or `None` if AVX is unavailable.
///
/// Both columns must have the same length (checked by the caller).
#[cfg(target_arch = "x86_64")]
#[inline]
pub(crate) fn count_avx(z_min: &[f32], z_max: &[f32], plane: f32) -> Option<usize> {
    if !avx_available() {
        return None;
    }
    // SAFETY: AVX support was verified above.
    Some(unsafe { count_avx_unchecked(z_min, z_max, plane) })
}

/// Counts straddling primitives with AVX, or `None` if AVX is unavailable.
#[cfg(not(target_arch = "x86_64"))]
#[inline]
pub(crate) fn count_avx(_z_min: &[f32], _z_max: &[f32], _plane: f32) -> Option<usize> {
    None
}

/// Full 8-wide batches through `vcmpps` + `vmovmskps`, tail through the
/// scalar rule.
///
/// # Safety
///
/// The CPU must support AVX.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn count_avx_unchecked(z_min: &[f32], z_max: &[f32], plane: f32) -> usize {
    use std::arch::x86_64::{
        _mm256_and_ps, _mm256_cmp_ps, _mm256_loadu_ps, _mm256_movemask_ps, _mm256_set1_ps,
        _CMP_GE_OQ, _CMP_LE_OQ,
    };

    let len = z_min.len().min(z_max.len());
    let full = len - len % AVX_LANES;

    // Broadcast the plane to every lane once
    let v_plane = _mm256_set1_ps(plane);
    let mut count = 0usize;

    let mut i = 0;
    while i < full {
        // Unaligned loads - columns carry no alignment guarantee
        let v_min = _mm256_loadu_ps(z_min.as_ptr().add(i));
        let v_max = _mm256_loadu_ps(z_max.as_ptr().add(i));

        // (z_min <= plane) AND (z_max >= plane), ordered: NaN lanes are false
        let mask = _mm256_and_ps(
            _mm256_cmp_ps::<_CMP_LE_OQ>(v_min, v_plane),
            _mm256_cmp_ps::<_CMP_GE_OQ>(v_max, v_plane),
        );
        count += _mm256_movemask_ps(mask).count_ones() as usize;
        i += AVX_LANES;
    }

    count + crate::filter::count_scalar_unchecked(&z_min[full..len], &z_max[full..len], plane)
}
