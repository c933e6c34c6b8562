//! Analysis service
//!
//! Validates analysis requests and runs them against the provider.
//!
//! Validation order:
//! 1. body is a JSON object
//! 2. `sessionId` is a UUID naming a live session
//! 3. the session's request budget allows one more request (429 otherwise)
//! 4. `imageIds`, if present, are UUIDs of images owned by that session
//! 5. `prompt` is a non-blank string within the length limit
//!
//! The provider call happens without holding any store lock; only the final
//! record insert touches the analysis repository.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::models::{AnalysisKind, AnalysisRecord, AnalysisResult, RateLimitKind, StoredImage};
use crate::provider::AnalysisProvider;
use crate::repositories::{AnalysisRepository, ImageRepository};
use crate::services::rate_limiter::RateLimitSnapshot;
use crate::services::session::{SessionError, SessionService};
use crate::services::validation::parse_uuid;

/// Video generation accepts at most one seed image
const MAX_VIDEO_IMAGES: usize = 1;

/// Error types for analysis operations
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Request body must be a JSON object")]
    InvalidBody,

    #[error("Session ID is required")]
    MissingSessionId,

    #[error("Invalid session ID format")]
    InvalidSessionId(String),

    #[error("Invalid session")]
    SessionNotFound(Uuid),

    #[error("Rate limit exceeded")]
    RateLimited(RateLimitSnapshot),

    #[error("imageIds must be an array")]
    ImageIdsNotArray,

    #[error("Maximum {max} images allowed")]
    TooManyImages { actual: usize, max: usize },

    #[error("Invalid image ID format")]
    InvalidImageId(String),

    #[error("Image not found")]
    ImageNotFound(Uuid),

    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Prompt must be a string")]
    PromptNotString(String),

    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Prompt exceeds maximum length")]
    PromptTooLong { actual: usize, max: usize },

    #[error("Provider request failed: {0}")]
    Provider(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AnalysisError {
    /// Human-readable specifics for the error response
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::InvalidSessionId(raw) => vec![format!("'{}' is not a valid UUID", raw)],
            Self::SessionNotFound(id) => vec![format!("Session {} not found or expired", id)],
            Self::TooManyImages { actual, max } => {
                vec![format!("Received {} image IDs, maximum is {}", actual, max)]
            }
            Self::InvalidImageId(raw) => vec![format!("'{}' is not a valid UUID", raw)],
            Self::ImageNotFound(id) => {
                vec![format!("Image {} does not exist or belongs to another session", id)]
            }
            Self::PromptNotString(raw) => vec![format!("Received {}", raw)],
            Self::PromptTooLong { actual, max } => {
                vec![format!("Prompt length: {} characters, limit: {} characters", actual, max)]
            }
            _ => Vec::new(),
        }
    }
}

/// A request that passed every validation step
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub session_id: Uuid,
    pub images: Vec<Arc<StoredImage>>,
    pub prompt: String,
    pub rate_limit: RateLimitSnapshot,
}

/// A stored record plus the rate-limit state to report in headers
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub rate_limit: RateLimitSnapshot,
}

/// Analysis service
pub struct AnalysisService {
    sessions: Arc<SessionService>,
    images: Arc<dyn ImageRepository>,
    analyses: Arc<dyn AnalysisRepository>,
    provider: Arc<dyn AnalysisProvider>,
    config: AnalysisConfig,
}

impl AnalysisService {
    pub fn new(
        sessions: Arc<SessionService>,
        images: Arc<dyn ImageRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        provider: Arc<dyn AnalysisProvider>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            sessions,
            images,
            analyses,
            provider,
            config,
        }
    }

    /// Validate and run an image analysis request
    pub async fn analyze(&self, body: &Value) -> Result<AnalysisOutcome, AnalysisError> {
        let request = self.validate(body, self.config.max_image_ids).await?;
        self.run(request).await
    }

    /// Validate and run a video generation request
    pub async fn generate_video(&self, body: &Value) -> Result<AnalysisOutcome, AnalysisError> {
        let request = self.validate(body, MAX_VIDEO_IMAGES).await?;
        self.run_video(request).await
    }

    /// Run the validation pipeline; charges one request on success of step 3
    pub async fn validate(&self, body: &Value, max_images: usize) -> Result<ValidatedRequest, AnalysisError> {
        let object = body.as_object().ok_or(AnalysisError::InvalidBody)?;

        let session_id = match object.get("sessionId") {
            None | Some(Value::Null) => return Err(AnalysisError::MissingSessionId),
            Some(Value::String(raw)) => {
                parse_uuid(raw).ok_or_else(|| AnalysisError::InvalidSessionId(raw.clone()))?
            }
            Some(other) => return Err(AnalysisError::InvalidSessionId(other.to_string())),
        };

        let outcome = self
            .sessions
            .touch_rate_limit(session_id, RateLimitKind::Requests, 1)
            .await
            .map_err(|e| match e {
                SessionError::NotFound => AnalysisError::SessionNotFound(session_id),
                SessionError::Internal(e) => AnalysisError::Internal(e),
            })?;
        let rate_limit = outcome.snapshot(RateLimitKind::Requests, Utc::now());
        if !outcome.allowed {
            return Err(AnalysisError::RateLimited(rate_limit));
        }

        let images = match object.get("imageIds") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(ids)) => self.resolve_images(session_id, ids, max_images).await?,
            Some(_) => return Err(AnalysisError::ImageIdsNotArray),
        };

        let prompt = match object.get("prompt") {
            None | Some(Value::Null) => return Err(AnalysisError::MissingPrompt),
            Some(Value::String(p)) => validate_prompt(p, self.config.max_prompt_chars)?,
            Some(other) => return Err(AnalysisError::PromptNotString(value_label(other))),
        };

        Ok(ValidatedRequest {
            session_id,
            images,
            prompt,
            rate_limit,
        })
    }

    async fn resolve_images(
        &self,
        session_id: Uuid,
        ids: &[Value],
        max_images: usize,
    ) -> Result<Vec<Arc<StoredImage>>, AnalysisError> {
        if ids.len() > max_images {
            return Err(AnalysisError::TooManyImages {
                actual: ids.len(),
                max: max_images,
            });
        }

        let mut images = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = raw
                .as_str()
                .and_then(parse_uuid)
                .ok_or_else(|| AnalysisError::InvalidImageId(value_label(raw)))?;
            let image = self
                .images
                .get_by_id(id)
                .await?
                .filter(|img| img.session_id == session_id)
                .ok_or(AnalysisError::ImageNotFound(id))?;
            images.push(image);
        }
        Ok(images)
    }

    /// Call the provider and record the result
    pub async fn run(&self, request: ValidatedRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let started = Instant::now();
        let output = self
            .provider
            .analyze(&request.prompt, &request.images)
            .await
            .map_err(AnalysisError::Provider)?;
        tracing::info!(
            provider = self.provider.name(),
            session = %request.session_id,
            images = request.images.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        let generated_images = if output.generated_images.is_empty() {
            None
        } else {
            Some(output.generated_images)
        };
        let record = AnalysisRecord::completed(
            request.session_id,
            request.images.iter().map(|img| img.id).collect(),
            request.prompt,
            AnalysisKind::Analysis,
            AnalysisResult {
                content: output.content,
                format: output.format,
                generated_images,
            },
            output.tokens_used,
        );
        let record = self.analyses.insert(record).await?;

        if let Some(tokens) = output.tokens_used {
            self.charge_tokens(request.session_id, tokens).await;
        }

        Ok(AnalysisOutcome {
            record,
            rate_limit: request.rate_limit,
        })
    }

    /// Generate a video from the prompt and optional seed image, then record it
    pub async fn run_video(&self, request: ValidatedRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let started = Instant::now();
        let seed = request.images.first().map(|img| img.as_ref());
        let video = self
            .provider
            .generate_video(&request.prompt, seed)
            .await
            .map_err(AnalysisError::Provider)?;
        tracing::info!(
            provider = self.provider.name(),
            session = %request.session_id,
            operation = %video.operation_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Video generation completed"
        );

        let record = AnalysisRecord::completed(
            request.session_id,
            request.images.iter().map(|img| img.id).collect(),
            request.prompt,
            AnalysisKind::Video,
            AnalysisResult {
                content: video.video_uri,
                format: "video".to_string(),
                generated_images: None,
            },
            None,
        );
        let record = self.analyses.insert(record).await?;

        Ok(AnalysisOutcome {
            record,
            rate_limit: request.rate_limit,
        })
    }

    /// Charge provider-reported usage after the fact; never fails the request
    async fn charge_tokens(&self, session_id: Uuid, tokens: u64) {
        match self
            .sessions
            .touch_rate_limit(session_id, RateLimitKind::Tokens, tokens)
            .await
        {
            Ok(outcome) if outcome.allowed => {}
            Ok(outcome) => tracing::warn!(
                "Session {} used {} tokens with only {} left this minute",
                session_id,
                tokens,
                outcome.session.rate_limits.tokens_per_minute.remaining
            ),
            Err(e) => tracing::warn!("Could not charge tokens to session {}: {}", session_id, e),
        }
    }
}

/// Trim and length-check a prompt, counting characters rather than bytes
pub fn validate_prompt(prompt: &str, max_chars: usize) -> Result<String, AnalysisError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptyPrompt);
    }
    let length = trimmed.chars().count();
    if length > max_chars {
        return Err(AnalysisError::PromptTooLong {
            actual: length,
            max: max_chars,
        });
    }
    Ok(trimmed.to_string())
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RateLimitKind, UploadInput};
    use crate::provider::{ProviderOutput, VideoOutput};
    use crate::repositories::{
        MemoryAnalysisRepository, MemoryImageRepository, MemorySessionRepository,
    };
    use crate::services::rate_limiter::RateLimiter;
    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AnalysisProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(&self, prompt: &str, images: &[Arc<StoredImage>]) -> anyhow::Result<ProviderOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("upstream unavailable");
            }
            Ok(ProviderOutput {
                content: format!("{} ({} images)", prompt, images.len()),
                format: "markdown".to_string(),
                tokens_used: Some(40),
                generated_images: Vec::new(),
            })
        }

        async fn generate_video(&self, _prompt: &str, image: Option<&StoredImage>) -> anyhow::Result<VideoOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VideoOutput {
                operation_name: "operations/test".to_string(),
                video_uri: format!("https://videos/{}.mp4", image.map(|i| i.id.to_string()).unwrap_or_default()),
            })
        }
    }

    struct Fixture {
        service: AnalysisService,
        sessions: Arc<SessionService>,
        images: Arc<dyn ImageRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        provider: Arc<StubProvider>,
    }

    fn setup_with(provider: StubProvider, requests_per_minute: u64) -> Fixture {
        let ttl = Duration::hours(1);
        let session_repo = MemorySessionRepository::boxed(ttl);
        let images = MemoryImageRepository::boxed();
        let analyses = MemoryAnalysisRepository::boxed();
        let sessions = Arc::new(SessionService::new(
            session_repo,
            images.clone(),
            analyses.clone(),
            RateLimiter::new(requests_per_minute, 100),
            ttl,
        ));
        let provider = Arc::new(provider);
        let service = AnalysisService::new(
            sessions.clone(),
            images.clone(),
            analyses.clone(),
            provider.clone(),
            AnalysisConfig::default(),
        );
        Fixture {
            service,
            sessions,
            images,
            analyses,
            provider,
        }
    }

    fn setup() -> Fixture {
        setup_with(StubProvider::default(), 10)
    }

    async fn upload(fx: &Fixture, session_id: Uuid) -> Uuid {
        let stored = fx
            .images
            .insert_batch(vec![StoredImage::new(
                session_id,
                UploadInput::new("a.png", "image/png", vec![1, 2, 3]),
            )])
            .await
            .unwrap();
        stored[0].id
    }

    #[tokio::test]
    async fn test_analyze_stores_completed_record() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();
        let image_id = upload(&fx, session.id).await;

        let outcome = fx
            .service
            .analyze(&json!({
                "sessionId": session.id.to_string(),
                "imageIds": [image_id.to_string()],
                "prompt": "  describe this  "
            }))
            .await
            .unwrap();

        let record = outcome.record;
        assert!(record.is_completed());
        assert_eq!(record.prompt, "describe this");
        assert_eq!(record.image_ids, vec![image_id]);
        assert_eq!(record.result.as_ref().unwrap().content, "describe this (1 images)");
        assert_eq!(outcome.rate_limit.remaining, 9);

        let stored = fx.analyses.get_by_request_id(record.request_id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_tokens_are_charged_after_provider_call() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();

        fx.service
            .analyze(&json!({"sessionId": session.id.to_string(), "prompt": "hi"}))
            .await
            .unwrap();

        let session = fx.sessions.get(session.id).await.unwrap();
        assert_eq!(session.rate_limits.tokens_per_minute.remaining, 60);
    }

    #[tokio::test]
    async fn test_non_object_body_rejected() {
        let fx = setup();
        for body in [json!([1, 2]), json!("text"), json!(null)] {
            let err = fx.service.analyze(&body).await.unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidBody));
        }
    }

    #[tokio::test]
    async fn test_session_id_validation() {
        let fx = setup();

        let err = fx.service.analyze(&json!({"prompt": "x"})).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingSessionId));

        let err = fx
            .service
            .analyze(&json!({"sessionId": "abc", "prompt": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidSessionId(_)));

        let err = fx
            .service
            .analyze(&json!({"sessionId": Uuid::new_v4().to_string(), "prompt": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_short_circuits_before_prompt_validation() {
        let fx = setup_with(StubProvider::default(), 1);
        let session = fx.sessions.create().await.unwrap();
        let body = json!({"sessionId": session.id.to_string(), "prompt": "ok"});
        fx.service.analyze(&body).await.unwrap();

        // Invalid prompt, but the budget is gone: rate limit wins
        let err = fx
            .service
            .analyze(&json!({"sessionId": session.id.to_string(), "prompt": ""}))
            .await
            .unwrap_err();
        match err {
            AnalysisError::RateLimited(snapshot) => {
                assert_eq!(snapshot.remaining, 0);
                assert_eq!(snapshot.limit, 1);
                assert!(snapshot.retry_after >= 1 && snapshot.retry_after <= 60);
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
        assert_eq!(fx.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cross_session_image_rejected() {
        let fx = setup();
        let owner = fx.sessions.create().await.unwrap();
        let intruder = fx.sessions.create().await.unwrap();
        let image_id = upload(&fx, owner.id).await;

        let err = fx
            .service
            .analyze(&json!({
                "sessionId": intruder.id.to_string(),
                "imageIds": [image_id.to_string()],
                "prompt": "what is this"
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::ImageNotFound(id) if id == image_id));
        assert_eq!(fx.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_id_validation() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();
        let sid = session.id.to_string();

        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "imageIds": "abc", "prompt": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ImageIdsNotArray));

        let ids: Vec<String> = (0..6).map(|_| Uuid::new_v4().to_string()).collect();
        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "imageIds": ids, "prompt": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::TooManyImages { actual: 6, max: 5 }));

        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "imageIds": [42], "prompt": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImageId(ref s) if s == "42"));

        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "imageIds": [Uuid::new_v4().to_string()], "prompt": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ImageNotFound(_)));
    }

    #[tokio::test]
    async fn test_prompt_validation() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();
        let sid = session.id.to_string();

        let err = fx.service.analyze(&json!({"sessionId": sid})).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingPrompt));

        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "prompt": 123}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Prompt must be a string");
        assert_eq!(err.details(), vec!["Received 123".to_string()]);

        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "prompt": "   \n"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyPrompt));

        let long = "é".repeat(2001);
        let err = fx
            .service
            .analyze(&json!({"sessionId": sid, "prompt": long}))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::PromptTooLong { actual: 2001, max: 2000 }));

        let exact = "é".repeat(2000);
        assert!(fx
            .service
            .analyze(&json!({"sessionId": sid, "prompt": exact}))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_provider_failure_stores_nothing() {
        let fx = setup_with(
            StubProvider {
                fail: true,
                ..Default::default()
            },
            10,
        );
        let session = fx.sessions.create().await.unwrap();

        let err = fx
            .service
            .analyze(&json!({"sessionId": session.id.to_string(), "prompt": "x"}))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Provider(_)));
        assert_eq!(fx.analyses.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_video_accepts_single_seed_image() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();
        let first = upload(&fx, session.id).await;
        let second = upload(&fx, session.id).await;

        let err = fx
            .service
            .generate_video(&json!({
                "sessionId": session.id.to_string(),
                "imageIds": [first.to_string(), second.to_string()],
                "prompt": "animate"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::TooManyImages { actual: 2, max: 1 }));

        let outcome = fx
            .service
            .generate_video(&json!({
                "sessionId": session.id.to_string(),
                "imageIds": [first.to_string()],
                "prompt": "animate"
            }))
            .await
            .unwrap();
        let result = outcome.record.result.unwrap();
        assert_eq!(result.format, "video");
        assert_eq!(result.content, format!("https://videos/{}.mp4", first));
        assert_eq!(outcome.record.kind, AnalysisKind::Video);
    }

    #[tokio::test]
    async fn test_record_stored_after_session_ends_is_swept() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();
        let request = fx
            .service
            .validate(&json!({"sessionId": session.id.to_string(), "prompt": "slow"}), 5)
            .await
            .unwrap();

        // the session goes away while the provider call is in flight
        fx.sessions.delete(session.id).await.unwrap();
        let outcome = fx.service.run(request).await.unwrap();
        assert_eq!(fx.analyses.count().await.unwrap(), 1);

        let report = fx.sessions.sweep_expired(Utc::now()).await.unwrap();
        assert_eq!(report.analyses, 1);
        assert!(fx
            .analyses
            .get_by_request_id(outcome.record.request_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_kind_in_snapshot() {
        let fx = setup();
        let session = fx.sessions.create().await.unwrap();
        let outcome = fx
            .service
            .analyze(&json!({"sessionId": session.id.to_string(), "prompt": "x"}))
            .await
            .unwrap();
        assert_eq!(outcome.rate_limit.kind, RateLimitKind::Requests);
    }
}
