//! Topic relevance boost.

use std::sync::Arc;

use tracing::debug;

use clipsift_ml_client::{max_similarity, MlResult, SimilarityService};
use clipsift_models::ClipCandidate;

/// Boosts candidate scores by their best similarity to caller topics.
#[derive(Clone)]
pub struct TopicFilter {
    service: Arc<dyn SimilarityService>,
}

impl TopicFilter {
    pub fn new(service: Arc<dyn SimilarityService>) -> Self {
        Self { service }
    }

    /// Multiply each score by `1 + max_similarity`.
    ///
    /// Blank topics are ignored; with no topics left the candidates are
    /// returned unchanged. On a service error the caller keeps the
    /// unboosted candidates.
    pub async fn apply(
        &self,
        candidates: &[ClipCandidate],
        topics: &[String],
    ) -> MlResult<Vec<ClipCandidate>> {
        let topics: Vec<String> = topics
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if topics.is_empty() || candidates.is_empty() {
            return Ok(candidates.to_vec());
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let matrix = self.service.similarity(&texts, &topics).await?;
        let best = max_similarity(&matrix);

        debug!(
            candidates = candidates.len(),
            topics = topics.len(),
            "Applied topic similarity"
        );

        Ok(boost(candidates, &best))
    }
}

/// Apply per-candidate similarities. Missing entries count as 0.
pub fn boost(candidates: &[ClipCandidate], similarities: &[f32]) -> Vec<ClipCandidate> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let similarity = similarities.get(i).copied().unwrap_or(0.0) as f64;
            c.clone().with_topic_similarity(similarity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clipsift_ml_client::MlError;
    use clipsift_models::ClipType;

    struct FixedSimilarity(Vec<Vec<f32>>);

    #[async_trait]
    impl SimilarityService for FixedSimilarity {
        async fn similarity(&self, _texts: &[String], _topics: &[String]) -> MlResult<Vec<Vec<f32>>> {
            Ok(self.0.clone())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl SimilarityService for Unavailable {
        async fn similarity(&self, _texts: &[String], _topics: &[String]) -> MlResult<Vec<Vec<f32>>> {
            Err(MlError::ServiceUnavailable("down".into()))
        }
    }

    fn candidates() -> Vec<ClipCandidate> {
        vec![
            ClipCandidate::new("rust ownership", 0.0, 10.0, 0.5, ClipType::Combined).unwrap(),
            ClipCandidate::new("cooking pasta", 10.0, 20.0, 0.4, ClipType::Combined).unwrap(),
        ]
    }

    fn topics() -> Vec<String> {
        vec!["rust".to_string(), "memory".to_string()]
    }

    #[tokio::test]
    async fn test_boost_never_decreases() {
        let filter = TopicFilter::new(Arc::new(FixedSimilarity(vec![
            vec![0.9, 0.3],
            vec![0.0, 0.0],
        ])));
        let before = candidates();
        let after = filter.apply(&before, &topics()).await.unwrap();

        for (b, a) in before.iter().zip(&after) {
            assert!(a.score >= b.score);
        }
        assert!((after[0].score - 0.5 * 1.9).abs() < 1e-6);
        assert_eq!(after[1].score, 0.4);
        assert_eq!(after[1].topic_similarity, Some(0.0));
    }

    #[tokio::test]
    async fn test_no_topics_is_noop() {
        let filter = TopicFilter::new(Arc::new(Unavailable));
        let before = candidates();
        let after = filter
            .apply(&before, &["  ".to_string()])
            .await
            .unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_service_error_is_returned() {
        let filter = TopicFilter::new(Arc::new(Unavailable));
        assert!(filter.apply(&candidates(), &topics()).await.is_err());
    }
}
