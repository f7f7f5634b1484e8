//! The similarity service seam.

use async_trait::async_trait;

use crate::error::MlResult;

/// Semantic similarity between texts and topics.
///
/// Implementations return an N×M matrix for N texts and M topics with every
/// value in `[0, 1]`.
#[async_trait]
pub trait SimilarityService: Send + Sync {
    async fn similarity(&self, texts: &[String], topics: &[String]) -> MlResult<Vec<Vec<f32>>>;
}

/// Row-wise maximum of a similarity matrix. Empty rows give 0.
pub fn max_similarity(matrix: &[Vec<f32>]) -> Vec<f32> {
    matrix
        .iter()
        .map(|row| row.iter().copied().fold(0.0_f32, f32::max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_similarity() {
        let matrix = vec![vec![0.1, 0.7, 0.3], vec![], vec![0.0, 0.0, 0.2]];
        assert_eq!(max_similarity(&matrix), vec![0.7, 0.0, 0.2]);
    }
}
