//! # Kernel Equivalence Test
//!
//! Proves the vectorized kernel never disagrees with the scalar oracle,
//! including every tail length a batch can leave behind.

use nanoscribe_slicing::{
    count_overlaps_scalar, count_overlaps_vectorized, BatchWidth, BoundColumns, FilterKernel,
    OverlapFilter, SliceError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random bound columns with extents up to 2.0 tall inside [0, 10].
fn random_columns(rng: &mut StdRng, len: usize) -> (Vec<f32>, Vec<f32>) {
    let z_min: Vec<f32> = (0..len).map(|_| rng.gen_range(0.0f32..10.0)).collect();
    let z_max: Vec<f32> = z_min.iter().map(|&z| z + rng.gen_range(0.0f32..2.0)).collect();
    (z_min, z_max)
}

#[test]
fn test_three_primitive_example() {
    let z_min = [0.0, 1.0, 2.0];
    let z_max = [1.0, 2.0, 3.0];
    assert_eq!(count_overlaps_vectorized(&z_min, &z_max, 1.5).unwrap(), 1);
    assert_eq!(count_overlaps_scalar(&z_min, &z_max, 1.5).unwrap(), 1);
}

#[test]
fn test_empty_input_counts_zero() {
    assert_eq!(count_overlaps_vectorized(&[], &[], 0.0).unwrap(), 0);
    assert_eq!(count_overlaps_scalar(&[], &[], 0.0).unwrap(), 0);
}

#[test]
fn test_two_full_batches() {
    let z_min = [0.0f32; 16];
    let z_max = [5.0f32; 16];
    assert_eq!(count_overlaps_vectorized(&z_min, &z_max, 2.5).unwrap(), 16);
    assert_eq!(count_overlaps_scalar(&z_min, &z_max, 2.5).unwrap(), 16);
}

#[test]
fn test_tail_lengths_are_never_dropped() {
    // Every primitive straddles, so the count must equal the length
    for len in [1, 7, 8, 9, 15, 16, 17, 31, 33] {
        let z_min = vec![0.0f32; len];
        let z_max = vec![1.0f32; len];
        assert_eq!(
            count_overlaps_vectorized(&z_min, &z_max, 0.5).unwrap(),
            len,
            "vectorized dropped primitives at len {len}"
        );
    }
}

#[test]
fn test_vectorized_matches_scalar_random() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for len in (0..=70).chain([255, 256, 257, 1000, 4099]) {
        let (z_min, z_max) = random_columns(&mut rng, len);
        for _ in 0..8 {
            let plane: f32 = rng.gen_range(-1.0..13.0);
            let oracle = count_overlaps_scalar(&z_min, &z_max, plane).unwrap();
            assert_eq!(
                count_overlaps_vectorized(&z_min, &z_max, plane).unwrap(),
                oracle,
                "len {len}, plane {plane}"
            );

            for width in BatchWidth::ALL {
                let filter = OverlapFilter::new(width, FilterKernel::Vectorized);
                assert_eq!(
                    filter.count(&z_min, &z_max, plane).unwrap(),
                    oracle,
                    "len {len}, plane {plane}, width {width:?}"
                );
            }
        }
    }
}

#[test]
fn test_plane_on_bounds_exactly() {
    let mut rng = StdRng::seed_from_u64(7);
    let (z_min, z_max) = random_columns(&mut rng, 123);

    // Planes taken from the data itself hit the inclusive edges
    for &plane in z_min.iter().chain(z_max.iter()).step_by(5) {
        assert_eq!(
            count_overlaps_vectorized(&z_min, &z_max, plane).unwrap(),
            count_overlaps_scalar(&z_min, &z_max, plane).unwrap(),
        );
    }
}

#[test]
fn test_nan_lanes_match_scalar() {
    let mut z_min = vec![0.0f32; 19];
    let z_max = vec![2.0f32; 19];
    z_min[3] = f32::NAN;
    z_min[12] = f32::NAN;
    z_min[18] = f32::NAN;

    assert_eq!(count_overlaps_scalar(&z_min, &z_max, 1.0).unwrap(), 16);
    assert_eq!(count_overlaps_vectorized(&z_min, &z_max, 1.0).unwrap(), 16);
}

#[test]
fn test_length_mismatch() {
    let result = count_overlaps_vectorized(&[0.0; 8], &[1.0; 7], 0.5);
    assert_eq!(result, Err(SliceError::LengthMismatch { z_min: 8, z_max: 7 }));
}

#[test]
fn test_million_triangles_agree() {
    let mut rng = StdRng::seed_from_u64(42);
    let z_min: Vec<f32> = (0..1_000_000).map(|_| rng.gen_range(0.0..10.0)).collect();
    let columns: BoundColumns = z_min.iter().map(|&z| (z, z + 0.1)).collect();

    let vectorized = OverlapFilter::new(BatchWidth::Lanes8, FilterKernel::Vectorized);
    let scalar = OverlapFilter::new(BatchWidth::Lanes8, FilterKernel::Scalar);

    let hits = vectorized.count_columns(&columns, 5.0);
    assert_eq!(hits, scalar.count_columns(&columns, 5.0));
    // ~1% of uniformly placed 0.1-tall extents cross the middle plane
    assert!(hits > 5_000 && hits < 15_000, "unexpected hit count {hits}");
}
