//! Similarity service request/response types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /similarity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityRequest {
    /// Texts to compare (one row each in the response)
    pub texts: Vec<String>,
    /// Topic strings (one column each in the response)
    pub topics: Vec<String>,
}

/// Response body: an N×M matrix, row per text, column per topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub similarities: Vec<Vec<f32>>,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
