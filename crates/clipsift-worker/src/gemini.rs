//! Gemini judge for clip quality.
//!
//! Sends one clip's text plus source metadata to the Gemini
//! `generateContent` endpoint and reads back five 0-10 axis scores. The
//! configured models are tried in order before the clip is given up on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use clipsift_models::{AnalysisContext, AxisScores, ClipCandidate};

use crate::error::{AnalysisError, WorkerError, WorkerResult};
use crate::quality::{ClipJudge, Judgement};
use crate::retry::{retry_async, RetryConfig};

/// Public Gemini API endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Structured verdict the prompt asks for.
#[derive(Debug, Deserialize)]
struct JudgeVerdict {
    viral_potential: f64,
    coherence: f64,
    engagement: f64,
    technical_quality: f64,
    hook_strength: f64,
    #[serde(default)]
    explanation: Option<String>,
}

impl From<JudgeVerdict> for Judgement {
    fn from(v: JudgeVerdict) -> Self {
        let judgement = Judgement::new(AxisScores {
            viral_potential: v.viral_potential,
            coherence: v.coherence,
            engagement: v.engagement,
            technical_quality: v.technical_quality,
            hook_strength: v.hook_strength,
        });
        match v.explanation {
            Some(explanation) => judgement.with_explanation(explanation),
            None => judgement,
        }
    }
}

/// Gemini-backed [`ClipJudge`].
pub struct GeminiJudge {
    api_key: String,
    client: Client,
    base_url: String,
    models: Vec<String>,
    retry: RetryConfig,
}

impl GeminiJudge {
    /// Create a judge using `GEMINI_API_KEY`.
    pub fn new(models: Vec<String>, timeout: Duration) -> WorkerResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| WorkerError::config_error("GEMINI_API_KEY not set"))?;
        Self::with_api_key(api_key, models, timeout)
    }

    pub fn with_api_key(
        api_key: impl Into<String>,
        models: Vec<String>,
        timeout: Duration,
    ) -> WorkerResult<Self> {
        if models.is_empty() {
            return Err(WorkerError::config_error("no Gemini models configured"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            models,
            retry: RetryConfig::new("gemini_judge").with_max_retries(1),
        })
    }

    /// Point the judge at another endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the scoring prompt for one clip.
    fn build_prompt(candidate: &ClipCandidate, context: &AnalysisContext) -> String {
        let title = context.source_title.as_deref().unwrap_or("unknown");
        let views = context
            .view_count
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let likes = context
            .like_count
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let topics = if context.topics.is_empty() {
            "none".to_string()
        } else {
            context.topics.join(", ")
        };

        format!(
            r#"You are rating a short clip cut from a longer video for social media.

SOURCE VIDEO: {title}
VIEWS: {views}
LIKES: {likes}
TARGET TOPICS: {topics}
CLIP DURATION: {duration:.1} seconds

CLIP TRANSCRIPT:
{text}

Rate the clip on each axis from 0 to 10:
- viral_potential: how likely the clip is to be shared
- coherence: whether it makes sense without the rest of the video
- engagement: how well it holds attention
- technical_quality: pacing and length fit for a short clip
- hook_strength: how strong the opening is

Return ONLY a single JSON object with this schema:
{{
  "viral_potential": 0,
  "coherence": 0,
  "engagement": 0,
  "technical_quality": 0,
  "hook_strength": 0,
  "explanation": "one sentence"
}}
"#,
            title = title,
            views = views,
            likes = likes,
            topics = topics,
            duration = candidate.duration,
            text = candidate.text,
        )
    }

    /// Call one model once.
    async fn call_model(&self, model: &str, prompt: &str) -> Result<Judgement, AnalysisError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::transport(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            AnalysisError::malformed(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| AnalysisError::malformed("No content in Gemini response"))?;

        parse_judgement(text)
    }
}

#[async_trait]
impl ClipJudge for GeminiJudge {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn judge(
        &self,
        candidate: &ClipCandidate,
        context: &AnalysisContext,
    ) -> Result<Judgement, AnalysisError> {
        let prompt = Self::build_prompt(candidate, context);
        let mut last_error = None;

        for model in &self.models {
            debug!("Judging {} with model {}", candidate.label(), model);
            let result = retry_async(
                &self.retry,
                |e: &AnalysisError| e.is_retryable(),
                || self.call_model(model, &prompt),
            )
            .await
            .into_result();

            match result {
                Ok(judgement) => {
                    info!("Judged {} with {}", candidate.label(), model);
                    return Ok(judgement);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AnalysisError::NotConfigured("no models".into())))
    }
}

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// First balanced `{...}` object in `text`, ignoring braces inside strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pull five validated axis scores and the rationale out of a free-form
/// model reply.
pub fn parse_judgement(text: &str) -> Result<Judgement, AnalysisError> {
    let body = strip_code_fence(text);
    let json = extract_json_object(body)
        .ok_or_else(|| AnalysisError::malformed("no JSON object in judge reply"))?;

    let verdict: JudgeVerdict = serde_json::from_str(json)
        .map_err(|e| AnalysisError::malformed(format!("Failed to parse verdict JSON: {}", e)))?;

    let judgement = Judgement::from(verdict);
    judgement
        .axes
        .validate()
        .map_err(|e| AnalysisError::malformed(e.to_string()))?;
    Ok(judgement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsift_models::ClipType;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VERDICT: &str = r#"{"viral_potential": 8, "coherence": 7, "engagement": 6, "technical_quality": 9, "hook_strength": 5, "explanation": "solid {hook}"}"#;

    fn gemini_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    fn judge(server: &MockServer, models: &[&str]) -> GeminiJudge {
        GeminiJudge::with_api_key(
            "test-key",
            models.iter().map(|m| m.to_string()).collect(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(server.uri())
        .with_retry(
            RetryConfig::new("test")
                .with_max_retries(1)
                .with_base_delay(Duration::from_millis(1)),
        )
    }

    fn candidate() -> ClipCandidate {
        ClipCandidate::new("Here's the thing about Rust.", 0.0, 30.0, 1.0, ClipType::Sentence)
            .unwrap()
    }

    #[test]
    fn test_parse_plain_json() {
        let judgement = parse_judgement(VERDICT).unwrap();
        assert_eq!(judgement.axes.viral_potential, 8.0);
        assert_eq!(judgement.axes.hook_strength, 5.0);
        assert_eq!(judgement.explanation.as_deref(), Some("solid {hook}"));
    }

    #[test]
    fn test_parse_fenced_and_wrapped() {
        let fenced = format!("```json\n{}\n```", VERDICT);
        assert!(parse_judgement(&fenced).is_ok());

        let chatty = format!("Sure! Here is my rating:\n{}\nHope that helps.", VERDICT);
        assert_eq!(parse_judgement(&chatty).unwrap().axes.coherence, 7.0);

        let terse = r#"{"viral_potential": 1, "coherence": 2, "engagement": 3, "technical_quality": 4, "hook_strength": 5}"#;
        assert_eq!(parse_judgement(terse).unwrap().explanation, None);
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(parse_judgement("no json here").is_err());
        assert!(parse_judgement(r#"{"viral_potential": 8}"#).is_err());
        let out_of_range = VERDICT.replace("\"coherence\": 7", "\"coherence\": 12");
        assert!(matches!(
            parse_judgement(&out_of_range),
            Err(AnalysisError::Malformed(_))
        ));
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let text = r#"prefix {"a": "x}y", "b": {"c": 1}} trailing }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"a": "x}y", "b": {"c": 1}}"#)
        );
        assert_eq!(extract_json_object("{ unterminated"), None);
    }

    #[test]
    fn test_prompt_includes_context() {
        let context = AnalysisContext {
            source_title: Some("Systems talk".into()),
            view_count: Some(1200),
            like_count: None,
            topics: vec!["rust".into(), "latency".into()],
        };
        let prompt = GeminiJudge::build_prompt(&candidate(), &context);
        assert!(prompt.contains("Systems talk"));
        assert!(prompt.contains("1200"));
        assert!(prompt.contains("rust, latency"));
        assert!(prompt.contains("Here's the thing about Rust."));
    }

    #[tokio::test]
    async fn test_judge_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-a:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(VERDICT)))
            .expect(1)
            .mount(&server)
            .await;

        let judgement = judge(&server, &["model-a"])
            .judge(&candidate(), &AnalysisContext::default())
            .await
            .unwrap();
        assert_eq!(judgement.axes.technical_quality, 9.0);
        assert_eq!(judgement.explanation.as_deref(), Some("solid {hook}"));
    }

    #[tokio::test]
    async fn test_judge_falls_through_models() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-a:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("not json")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-b:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(VERDICT)))
            .expect(1)
            .mount(&server)
            .await;

        let judgement = judge(&server, &["model-a", "model-b"])
            .judge(&candidate(), &AnalysisContext::default())
            .await
            .unwrap();
        assert_eq!(judgement.axes.engagement, 6.0);
    }

    #[tokio::test]
    async fn test_judge_retries_server_errors_then_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/model-a:generateContent"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let err = judge(&server, &["model-a"])
            .judge(&candidate(), &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Status { status: 503, .. }));
    }

    #[test]
    fn test_requires_models() {
        assert!(GeminiJudge::with_api_key("k", Vec::new(), Duration::from_secs(1)).is_err());
    }
}
