//! Cosine-similarity ranking over stored embeddings.

use crate::{Error, Result, record::Embedded};

/// Dimension of every embedding produced by the ingestion pipeline.
///
/// Vectors of other lengths are not rejected; they simply never compare as
/// similar to anything (see [`cosine_similarity`]).
pub const EMBEDDING_DIMENSION: usize = 768;

/// Embeddings are stored as JSON arrays, so every component must be finite.
pub fn validate_embedding(embedding: &[f32]) -> Result<()> {
  match embedding.iter().position(|x| !x.is_finite()) {
    Some(idx) => Err(Error::validation(format!(
      "embedding component {idx} is not finite"
    ))),
    None => Ok(()),
  }
}

/// `dot(a, b) / (‖a‖·‖b‖)`.
///
/// Mismatched lengths and zero-norm vectors yield `0.0` instead of an error,
/// which keeps historical embeddings of an older dimension searchable without
/// ever matching.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }

  let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
    (0.0_f64, 0.0_f64, 0.0_f64),
    |(dot, na, nb), (&x, &y)| {
      let (x, y) = (f64::from(x), f64::from(y));
      (dot + x * y, na + x * x, nb + y * y)
    },
  );

  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Rank `candidates` by similarity to `query` and keep the best `limit`.
///
/// Candidates without an embedding are dropped before ranking. The sort is
/// stable, so equally similar candidates keep their input order. A `limit`
/// larger than the candidate count returns every candidate.
pub fn top_k<T: Embedded>(query: &[f32], candidates: Vec<T>, limit: usize) -> Vec<T> {
  let mut scored: Vec<(f32, T)> = candidates
    .into_iter()
    .filter(|c| !c.embedding().is_empty())
    .map(|c| (cosine_similarity(query, c.embedding()), c))
    .collect();

  scored.sort_by(|a, b| b.0.total_cmp(&a.0));
  scored.truncate(limit.min(scored.len()));
  scored.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Doc(&'static str, Vec<f32>);

  impl Embedded for Doc {
    fn embedding(&self) -> &[f32] { &self.1 }
  }

  #[test]
  fn identical_and_orthogonal_vectors() {
    assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
  }

  #[test]
  fn mismatched_lengths_and_zero_vectors_score_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
  }

  #[test]
  fn ranks_closest_first_and_drops_missing_embeddings() {
    let docs = vec![
      Doc("far", vec![0.0, 1.0, 0.0]),
      Doc("none", vec![]),
      Doc("near", vec![0.9, 0.1, 0.0]),
      Doc("mid", vec![0.5, 0.5, 0.0]),
    ];
    let ranked = top_k(&[1.0, 0.0, 0.0], docs, 10);
    let names: Vec<_> = ranked.iter().map(|d| d.0).collect();
    assert_eq!(names, vec!["near", "mid", "far"]);
  }

  #[test]
  fn limit_is_clamped_and_empty_input_is_empty() {
    let docs = vec![Doc("a", vec![1.0]), Doc("b", vec![0.5])];
    assert_eq!(top_k(&[1.0], docs, 1).len(), 1);
    assert!(top_k::<Doc>(&[1.0], Vec::new(), 5).is_empty());
  }

  #[test]
  fn full_dimension_vectors_rank_by_angle() {
    let basis = |i: usize| {
      let mut v = vec![0.0_f32; EMBEDDING_DIMENSION];
      v[i] = 1.0;
      v
    };
    let query = basis(0);
    let mut near = basis(0);
    near[1] = 0.2;
    let mut mid = basis(0);
    mid[1] = 1.0;

    let docs = vec![
      Doc("orthogonal", basis(EMBEDDING_DIMENSION - 1)),
      Doc("mid", mid),
      Doc("near", near),
    ];
    let ranked = top_k(&query, docs, 3);
    let names: Vec<_> = ranked.iter().map(|d| d.0).collect();
    assert_eq!(names, vec!["near", "mid", "orthogonal"]);
  }

  #[test]
  fn non_finite_components_are_rejected() {
    assert!(validate_embedding(&[0.5, f32::NAN]).unwrap_err().is_validation());
    assert!(validate_embedding(&[f32::INFINITY]).is_err());
    validate_embedding(&[]).unwrap();
    validate_embedding(&[0.0, -1.0, 3.5]).unwrap();
  }

  #[test]
  fn ties_keep_input_order() {
    let docs = vec![Doc("first", vec![1.0, 0.0]), Doc("second", vec![2.0, 0.0])];
    let ranked = top_k(&[1.0, 0.0], docs, 2);
    assert_eq!(ranked[0].0, "first");
  }
}
