//! Vector Math
//!
//! Distance and similarity kernels shared by the store and the scorer.

use crate::error::{Error, Result};

#[inline]
fn check_dims(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Compute dot product of two vectors
///
/// Uses unrolled loop for better CPU performance. Accumulates in `f64`.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len().min(b.len());
    let mut sum = 0.0f64;

    // Process 4 elements at a time (manual unrolling)
    let chunks = len / 4;
    let remainder = len % 4;

    for i in 0..chunks {
        let idx = i * 4;
        sum += a[idx] as f64 * b[idx] as f64;
        sum += a[idx + 1] as f64 * b[idx + 1] as f64;
        sum += a[idx + 2] as f64 * b[idx + 2] as f64;
        sum += a[idx + 3] as f64 * b[idx + 3] as f64;
    }

    for i in (len - remainder)..len {
        sum += a[i] as f64 * b[i] as f64;
    }

    sum
}

/// Euclidean norm of a vector
#[inline]
pub fn magnitude(v: &[f32]) -> f64 {
    v.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt()
}

/// Squared Euclidean distance, the metric of a flat L2 index.
///
/// Identical inputs always yield exactly `0.0`.
#[inline]
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len().min(b.len());
    let mut sum = 0.0f32;

    let chunks = len / 4;
    let remainder = len % 4;

    for i in 0..chunks {
        let idx = i * 4;
        let d0 = a[idx] - b[idx];
        let d1 = a[idx + 1] - b[idx + 1];
        let d2 = a[idx + 2] - b[idx + 2];
        let d3 = a[idx + 3] - b[idx + 3];
        sum += d0 * d0 + d1 * d1 + d2 * d2 + d3 * d3;
    }

    for i in (len - remainder)..len {
        let d = a[i] - b[i];
        sum += d * d;
    }

    sum
}

/// Compute cosine similarity between two vectors
///
/// Returns value in range [-1, 1] where 1 means identical direction.
/// Fails with [`Error::NonFinite`] when a component is NaN or infinite, and
/// with [`Error::ZeroVector`] when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    check_dims(a, b)?;
    if a.iter().chain(b).any(|x| !x.is_finite()) {
        return Err(Error::NonFinite("embedding"));
    }

    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    let denom = mag_a * mag_b;
    if denom == 0.0 {
        return Err(Error::ZeroVector);
    }

    Ok((dot_product(a, b) / denom).clamp(-1.0, 1.0))
}

/// Cosine similarity rescaled from [-1, 1] onto [0, 1] via `(cos + 1) / 2`.
pub fn cosine_similarity_01(a: &[f32], b: &[f32]) -> Result<f64> {
    let cos = cosine_similarity(a, b)?;
    Ok(((cos + 1.0) / 2.0).clamp(0.0, 1.0))
}

/// Normalize a vector in place; zero vectors are left untouched
pub fn normalize_vector(v: &mut [f32]) {
    let mag = magnitude(v);
    if mag > 0.0 {
        for x in v.iter_mut() {
            *x = (*x as f64 / mag) as f32;
        }
    }
}
