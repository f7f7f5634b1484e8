//! Client for the text similarity service.
//!
//! Topic relevance filtering asks an external embedding service how close
//! each clip text is to each caller topic. This crate provides the
//! [`SimilarityService`] seam and its HTTP implementation.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{SimilarityClient, SimilarityClientConfig};
pub use error::{MlError, MlResult};
pub use service::{max_similarity, SimilarityService};
pub use types::{SimilarityRequest, SimilarityResponse};
