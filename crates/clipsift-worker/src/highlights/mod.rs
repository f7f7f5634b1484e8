//! Highlight detection from transcript text.
//!
//! Candidate generation, heuristic scoring, overlap resolution, topic
//! boosting and final selection. Everything here except the topic boost is
//! pure and synchronous.

pub mod generator;
pub mod overlap;
pub mod scorer;
pub mod selector;
pub mod topic;

pub use generator::{
    CandidateGenerator, CandidateStrategy, GenerationContext, QuestionAnswerStrategy,
    SentenceStrategy, SingleSegmentStrategy, SlidingCombinationStrategy, TopicTransitionStrategy,
};
pub use overlap::{overlap_ratio, resolve_overlaps};
pub use scorer::{HeuristicScorer, ScoreBreakdown};
pub use selector::select;
pub use topic::TopicFilter;
