//! Vector similarity helpers shared by the embedding models and the in-memory index

/// Calculate cosine similarity between two embeddings
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() {
    return 0.0;
  }

  let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
  let magnitude_a = magnitude(a);
  let magnitude_b = magnitude(b);

  if magnitude_a == 0.0 || magnitude_b == 0.0 {
    0.0
  } else {
    dot_product / (magnitude_a * magnitude_b)
  }
}

/// L2 norm of a vector
pub fn magnitude(v: &[f32]) -> f32 {
  v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length in place. Zero vectors are left unchanged.
pub fn normalize(v: &mut [f32]) {
  let norm = magnitude(v);
  if norm < f32::EPSILON {
    return;
  }
  for value in v.iter_mut() {
    *value /= norm;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_vectors_score_one() {
    let v = [0.3, 0.4, 0.5];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn orthogonal_vectors_score_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
  }

  #[test]
  fn opposite_vectors_score_minus_one() {
    assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
  }

  #[test]
  fn mismatched_lengths_score_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
  }

  #[test]
  fn zero_vector_scores_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
  }

  #[test]
  fn normalize_produces_unit_length() {
    let mut v = vec![3.0, 4.0];
    normalize(&mut v);
    assert!((magnitude(&v) - 1.0).abs() < 1e-6);
    assert!((v[0] - 0.6).abs() < 1e-6);
  }

  #[test]
  fn normalize_leaves_zero_vector_alone() {
    let mut v = vec![0.0, 0.0];
    normalize(&mut v);
    assert_eq!(v, vec![0.0, 0.0]);
  }
}
