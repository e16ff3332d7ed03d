/// Tolerance used when checking that a stored vector is unit length
pub const UNIT_NORM_TOLERANCE: f32 = 1e-3;

pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// True for unit-length vectors and for the all-zero vector (the embedding of empty text).
pub fn is_normalized(vector: &[f32]) -> bool {
    let norm = l2_norm(vector);
    norm == 0.0 || (norm - 1.0).abs() <= UNIT_NORM_TOLERANCE
}

/// Plain dot product. Equals cosine similarity only when both inputs are unit-normalized.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity in [-1, 1]; zero when either side is the zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}
