//! Quality analysis with an external judge and a heuristic fallback.
//!
//! Every candidate resolves to a [`QualityAssessment`]. Judge failures,
//! per-call timeouts and the run deadline only ever affect the candidate
//! they happened to; that candidate is scored heuristically instead.

pub mod heuristic;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

use clipsift_models::{
    AnalysisContext, AnalyzerSource, AxisScores, ClipCandidate, QualityAssessment, ScoringProfile,
};

use crate::error::AnalysisError;
use crate::metrics;

pub use heuristic::HeuristicAnalyzer;

/// A judge's verdict on one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    pub axes: AxisScores,
    /// Free-text rationale, when the judge gave one
    pub explanation: Option<String>,
}

impl Judgement {
    pub fn new(axes: AxisScores) -> Self {
        Self {
            axes,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        let trimmed = explanation.trim();
        self.explanation = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

impl From<AxisScores> for Judgement {
    fn from(axes: AxisScores) -> Self {
        Self::new(axes)
    }
}

/// External reasoning service that scores one clip on five axes.
#[async_trait]
pub trait ClipJudge: Send + Sync {
    fn name(&self) -> &str;

    async fn judge(
        &self,
        candidate: &ClipCandidate,
        context: &AnalysisContext,
    ) -> Result<Judgement, AnalysisError>;
}

/// A candidate together with its quality verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClip {
    pub candidate: ClipCandidate,
    pub assessment: QualityAssessment,
}

impl ScoredClip {
    /// Attach `assessment`, copying its verdict onto the candidate.
    pub fn new(candidate: ClipCandidate, assessment: QualityAssessment) -> Self {
        let candidate = candidate.with_quality(assessment.overall_score, assessment.recommended);
        Self {
            candidate,
            assessment,
        }
    }
}

/// Limits applied to judge calls.
#[derive(Debug, Clone)]
pub struct AnalyzerLimits {
    /// Maximum concurrent judge calls
    pub concurrency: usize,
    /// Timeout for one judge call
    pub call_timeout: Duration,
    /// Candidates beyond this many (in input order) skip the judge
    pub max_judged: usize,
}

impl Default for AnalyzerLimits {
    fn default() -> Self {
        Self {
            concurrency: 4,
            call_timeout: Duration::from_secs(30),
            max_judged: 40,
        }
    }
}

/// Resolves every candidate to an assessment.
#[derive(Clone)]
pub struct QualityAnalyzer {
    judge: Option<Arc<dyn ClipJudge>>,
    heuristic: HeuristicAnalyzer,
    limits: AnalyzerLimits,
}

impl QualityAnalyzer {
    pub fn new(judge: Option<Arc<dyn ClipJudge>>, profile: Arc<ScoringProfile>) -> Self {
        Self {
            judge,
            heuristic: HeuristicAnalyzer::new(profile),
            limits: AnalyzerLimits::default(),
        }
    }

    /// Analyzer that never calls out.
    pub fn heuristic_only(profile: Arc<ScoringProfile>) -> Self {
        Self::new(None, profile)
    }

    pub fn with_limits(mut self, limits: AnalyzerLimits) -> Self {
        self.limits = AnalyzerLimits {
            concurrency: limits.concurrency.max(1),
            ..limits
        };
        self
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    /// Heuristic assessment tagged with why the judge was not used.
    fn fallback(&self, candidate: &ClipCandidate, reason: &str) -> QualityAssessment {
        self.heuristic.assess(candidate).with_fallback_reason(reason)
    }

    /// Assess one candidate, bounded by the per-call timeout and `deadline`.
    pub async fn assess(
        &self,
        candidate: &ClipCandidate,
        context: &AnalysisContext,
        deadline: Instant,
    ) -> QualityAssessment {
        let judge = match &self.judge {
            Some(judge) => judge,
            None => return self.fallback(candidate, "judge not configured"),
        };

        let started = std::time::Instant::now();
        let call = async {
            match tokio::time::timeout(self.limits.call_timeout, judge.judge(candidate, context)).await {
                Ok(result) => result,
                Err(_) => Err(AnalysisError::Timeout(self.limits.call_timeout.as_secs())),
            }
        };
        let result = tokio::time::timeout_at(deadline, call)
            .await
            .unwrap_or(Err(AnalysisError::DeadlineExceeded));

        let assessment = match result.and_then(|judgement| {
            judgement
                .axes
                .validate()
                .map(|_| judgement)
                .map_err(|e| AnalysisError::malformed(e.to_string()))
        }) {
            Ok(judgement) => {
                debug!(candidate = %candidate.label(), judge = judge.name(), "Judge scored clip");
                let assessment =
                    QualityAssessment::from_axes(judgement.axes, AnalyzerSource::ExternalJudge);
                match judgement.explanation {
                    Some(explanation) => assessment.with_explanation(explanation),
                    None => assessment,
                }
            }
            Err(e) => {
                warn!(
                    candidate = %candidate.label(),
                    judge = judge.name(),
                    "Judge failed, using heuristic score: {}", e
                );
                self.fallback(candidate, &e.to_string())
            }
        };

        metrics::record_judge_call(assessment.source, started.elapsed().as_secs_f64());
        assessment
    }

    /// Assess all candidates with at most `concurrency` judge calls in flight.
    ///
    /// Output order matches input order.
    pub async fn analyze_all(
        &self,
        candidates: Vec<ClipCandidate>,
        context: &AnalysisContext,
        deadline: Instant,
    ) -> Vec<ScoredClip> {
        let semaphore = Arc::new(Semaphore::new(self.limits.concurrency));

        let tasks = candidates.into_iter().enumerate().map(|(index, candidate)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                if self.judge.is_some() && index >= self.limits.max_judged {
                    let assessment = self.fallback(&candidate, "beyond judge limit");
                    return ScoredClip::new(candidate, assessment);
                }

                let permit = tokio::time::timeout_at(deadline, semaphore.acquire_owned()).await;
                let assessment = match permit {
                    Ok(Ok(_permit)) => self.assess(&candidate, context, deadline).await,
                    Ok(Err(_)) | Err(_) => {
                        self.fallback(&candidate, &AnalysisError::DeadlineExceeded.to_string())
                    }
                };
                ScoredClip::new(candidate, assessment)
            }
        });

        join_all(tasks).await
    }
}
