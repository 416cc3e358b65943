//! Embedding trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that all embedding backends implement,
//! plus pure helpers for the fixed-dimension invariant, vector
//! serialization, and similarity computation.
//!
//! Concrete HTTP-backed embedders live in the `coderag` app crate.

/// A synchronous text → vector embedder.
///
/// # Contract
///
/// [`embed`](Embedder::embed) returns exactly one vector per input text, in
/// input order, and every vector has exactly [`dims`](Embedder::dims)
/// elements. A failure for one text must not fail the batch: the
/// implementation substitutes [`zero_vector`] for that text instead.
///
/// Implementations may block (network I/O). Async callers are expected to
/// run them on a blocking worker rather than on the scheduler thread.
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text:latest"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    fn embed(&self, texts: &[String]) -> Vec<Vec<f32>>;
}

/// An all-zero vector of length `dims`, used in place of a failed embedding.
pub fn zero_vector(dims: usize) -> Vec<f32> {
    vec![0.0; dims]
}

/// Accept a provider vector only if it has exactly `dims` finite elements.
pub fn conform(vector: Vec<f32>, dims: usize) -> Option<Vec<f32>> {
    if vector.len() == dims && vector.iter().all(|v| v.is_finite()) {
        Some(vector)
    } else {
        None
    }
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// # Example
///
/// ```rust
/// use coderag_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors of
/// different lengths, and zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Cosine distance `1 - cosine_similarity`, in `[0.0, 2.0]`.
///
/// A zero vector sits at distance `1.0` from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - f64::from(cosine_similarity(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }

    #[test]
    fn test_zero_vector_has_dims() {
        let v = zero_vector(768);
        assert_eq!(v.len(), 768);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_conform_rejects_wrong_length_and_nan() {
        assert_eq!(conform(vec![1.0, 2.0], 2), Some(vec![1.0, 2.0]));
        assert_eq!(conform(vec![1.0], 2), None);
        assert_eq!(conform(vec![1.0, f32::NAN], 2), None);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_distance_is_one() {
        let q = vec![0.3, 0.4];
        assert!((cosine_distance(&q, &zero_vector(2)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
