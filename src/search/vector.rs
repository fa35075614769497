

use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;

use crate::db::ProductRecord;


#[derive(Error, Debug)]
pub enum VectorSearchError {
    #[error("Vector backend error: {0}")]
    Backend(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}


/// Nearest-neighbour search over product vectors. Results are ordered by
/// descending similarity; higher scores mean more similar.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<(ProductRecord, f32)>, VectorSearchError>;
}


#[async_trait]
impl VectorIndex for Arc<dyn VectorIndex> {
    async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<(ProductRecord, f32)>, VectorSearchError> {
        (**self).similarity_search(vector, k).await
    }
}


pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorSearchError> {
    if a.len() != b.len() {
        return Err(VectorSearchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = cosine_similarity(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, VectorSearchError::DimensionMismatch { expected: 1, actual: 2 }));
    }
}
