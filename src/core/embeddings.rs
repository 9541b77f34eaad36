use ndarray::{ArrayView1, Zip};

/// Distance reported when either vector has zero magnitude.
///
/// Cosine distance is undefined there, so such a pair is treated as the
/// farthest possible match instead of surfacing a numeric error.
pub const MAX_COSINE_DISTANCE: f32 = 2.0;

/// Compute cosine similarity between two embeddings.
///
/// Returns `None` when either vector has zero magnitude or the similarity is
/// not a finite number. The result is clamped to `[-1, 1]`. Both slices must
/// have the same length.
///
/// Products are accumulated in `f64`, so any finite non-zero `f32` vector has
/// a usable norm even when squaring its components in `f32` would underflow
/// or overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    debug_assert_eq!(a.len(), b.len());

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let (dot_product, norm_a_sq, norm_b_sq) =
        Zip::from(&a)
            .and(&b)
            .fold((0.0f64, 0.0f64, 0.0f64), |(dot, aa, bb), &x, &y| {
                let (x, y) = (f64::from(x), f64::from(y));
                (dot + x * y, aa + x * x, bb + y * y)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();
    if !(norm_a > 0.0 && norm_b > 0.0) {
        return None;
    }

    let similarity = dot_product / (norm_a * norm_b);
    similarity
        .is_finite()
        .then(|| similarity.clamp(-1.0, 1.0) as f32)
}

/// Compute cosine distance (`1 - cosine similarity`) between two embeddings.
///
/// The result lies in `[0, 2]`. A zero-magnitude or non-finite operand
/// yields [`MAX_COSINE_DISTANCE`].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    match cosine_similarity(a, b) {
        Some(similarity) => 1.0 - similarity,
        None => MAX_COSINE_DISTANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-6);

        // Orthogonal vectors
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);

        // Opposite vectors
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!((cosine_similarity(&a, &b).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_ignores_magnitude() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_range() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);

        // 1 - 0.9 / sqrt(0.82)
        let d = cosine_distance(&[1.0, 0.0], &[0.9, 0.1]);
        assert!((d - 0.006116).abs() < 1e-5, "got {d}");
    }

    #[test]
    fn test_zero_magnitude_is_max_distance() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), MAX_COSINE_DISTANCE);
        assert_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 0.0]), MAX_COSINE_DISTANCE);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[0.0, 0.0]), MAX_COSINE_DISTANCE);
    }

    #[test]
    fn test_non_finite_is_max_distance() {
        assert_eq!(cosine_distance(&[f32::NAN, 0.0], &[1.0, 0.0]), MAX_COSINE_DISTANCE);
        assert_eq!(cosine_distance(&[f32::INFINITY, 0.0], &[1.0, 0.0]), MAX_COSINE_DISTANCE);
    }

    #[test]
    fn test_tiny_and_huge_vectors_keep_their_direction() {
        // Squared components underflow to zero in f32
        let tiny = [1e-25, 0.0];
        assert!(cosine_distance(&tiny, &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&tiny, &[0.0, 1.0]) - 1.0).abs() < 1e-6);

        // Squared components overflow to infinity in f32
        let huge = [1e20, 0.0];
        assert!(cosine_distance(&huge, &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&huge, &[-3.0, 0.0]) - 2.0).abs() < 1e-6);

        let smallest = [f32::MIN_POSITIVE / 8.0, f32::MIN_POSITIVE / 8.0];
        let largest = [f32::MAX, f32::MAX];
        assert!(cosine_distance(&smallest, &largest).abs() < 1e-6);
    }
}
