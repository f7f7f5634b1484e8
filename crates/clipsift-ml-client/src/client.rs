//! Similarity service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{MlError, MlResult};
use crate::service::SimilarityService;
use crate::types::{HealthResponse, SimilarityRequest, SimilarityResponse};

/// Configuration for the similarity client.
#[derive(Debug, Clone)]
pub struct SimilarityClientConfig {
    /// Base URL of the similarity service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
}

impl Default for SimilarityClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl SimilarityClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// Returns `None` when `CLIPSIFT_SIMILARITY_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CLIPSIFT_SIMILARITY_URL").ok()?;
        let defaults = Self::new(base_url);
        Some(Self {
            timeout: Duration::from_secs(
                std::env::var("CLIPSIFT_SIMILARITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.timeout.as_secs()),
            ),
            max_retries: std::env::var("CLIPSIFT_SIMILARITY_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            ..defaults
        })
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

/// HTTP client for the similarity service.
pub struct SimilarityClient {
    http: Client,
    config: SimilarityClientConfig,
}

impl SimilarityClient {
    /// Create a new similarity client.
    pub fn new(config: SimilarityClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        let config = SimilarityClientConfig::from_env().ok_or(MlError::NotConfigured)?;
        Self::new(config)
    }

    /// Check if the service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Similarity service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Similarity service health check error: {}", e);
                Ok(false)
            }
        }
    }

    async fn request_matrix(&self, request: &SimilarityRequest) -> MlResult<Vec<Vec<f32>>> {
        let url = format!("{}/similarity", self.config.base_url);
        debug!(
            texts = request.texts.len(),
            topics = request.topics.len(),
            "Sending similarity request to {}",
            url
        );

        let response = self.http.post(&url).json(request).send().await.map_err(|e| {
            if e.is_timeout() {
                MlError::Timeout(self.config.timeout.as_secs())
            } else {
                MlError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("similarity service returned {}: {}", status, body);
            return Err(
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    MlError::ServiceUnavailable(message)
                } else {
                    MlError::RequestFailed(message)
                },
            );
        }

        let parsed: SimilarityResponse = response.json().await?;
        validate_matrix(parsed.similarities, request.texts.len(), request.topics.len())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.pow(attempt);
                    warn!(
                        "Similarity request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Check shape, reject non-finite values, clamp into `[0, 1]`.
fn validate_matrix(
    matrix: Vec<Vec<f32>>,
    rows: usize,
    cols: usize,
) -> MlResult<Vec<Vec<f32>>> {
    if matrix.len() != rows {
        return Err(MlError::InvalidResponse(format!(
            "expected {} rows, got {}",
            rows,
            matrix.len()
        )));
    }

    matrix
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != cols {
                return Err(MlError::InvalidResponse(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            row.into_iter()
                .map(|v| {
                    if v.is_finite() {
                        Ok(v.clamp(0.0, 1.0))
                    } else {
                        Err(MlError::InvalidResponse(format!(
                            "non-finite similarity in row {}",
                            i
                        )))
                    }
                })
                .collect::<MlResult<Vec<f32>>>()
        })
        .collect()
}

#[async_trait]
impl SimilarityService for SimilarityClient {
    async fn similarity(&self, texts: &[String], topics: &[String]) -> MlResult<Vec<Vec<f32>>> {
        if texts.is_empty() || topics.is_empty() {
            return Ok(vec![Vec::new(); texts.len()]);
        }

        let request = SimilarityRequest {
            texts: texts.to_vec(),
            topics: topics.to_vec(),
        };

        self.with_retry(|| self.request_matrix(&request)).await
    }
}
