//! Gemini provider using the generateContent and predictLongRunning APIs

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use data_encoding::BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{AnalysisProvider, ProviderOutput, VideoOutput};
use crate::config::ProviderConfig;
use crate::models::{GeneratedImage, StoredImage};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    video_model: String,
    video_poll_interval: Duration,
    video_timeout: Duration,
}

impl GeminiProvider {
    pub fn from_config(api_key: &str, config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            video_model: config.video_model.clone(),
            video_poll_interval: config.video_poll_interval(),
            video_timeout: config.video_timeout(),
        })
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(&self, url: &str, body: &B) -> Result<R> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .context("Gemini request failed")?;
        read_json(response).await
    }

    async fn poll_operation(&self, name: &str) -> Result<VideoOutput> {
        let url = format!("{}/{}", self.base_url, name);
        let started = Instant::now();
        loop {
            let response = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await
                .context("Gemini operation poll failed")?;
            let operation: Operation = read_json(response).await?;

            if let Some(video) = parse_operation(name, operation)? {
                return Ok(video);
            }
            if started.elapsed() >= self.video_timeout {
                bail!(
                    "Video generation {} did not finish within {}s",
                    name,
                    self.video_timeout.as_secs()
                );
            }
            debug!("Video operation {} still running", name);
            tokio::time::sleep(self.video_poll_interval).await;
        }
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, prompt: &str, images: &[Arc<StoredImage>]) -> Result<ProviderOutput> {
        let request = build_content_request(prompt, images);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Sending {} image(s) to {}", images.len(), self.model);

        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        parse_content_response(response)
    }

    async fn generate_video(&self, prompt: &str, image: Option<&StoredImage>) -> Result<VideoOutput> {
        let request = build_video_request(prompt, image);
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, self.video_model);

        let started: Operation = self.post_json(&url, &request).await?;
        let name = started
            .name
            .clone()
            .ok_or_else(|| anyhow!("Gemini did not return an operation name"))?;
        info!("Started video operation {}", name);

        if let Some(video) = parse_operation(&name, started)? {
            return Ok(video);
        }
        self.poll_operation(&name).await
    }
}

async fn read_json<R: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".into());
        bail!("Gemini API error {}: {}", status, body);
    }
    response
        .json()
        .await
        .context("Failed to decode Gemini response")
}

// -- generateContent --

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn build_content_request(prompt: &str, images: &[Arc<StoredImage>]) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part {
        text: Some(prompt.to_string()),
        inline_data: None,
    });
    for image in images {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.buffer),
            }),
        });
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
    }
}

fn parse_content_response(response: GenerateContentResponse) -> Result<ProviderOutput> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        bail!("Prompt blocked by provider: {}", reason);
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini returned no candidates"))?;
    let finish_reason = candidate.finish_reason;
    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

    let mut text = Vec::new();
    let mut generated_images = Vec::new();
    for part in parts {
        if let Some(t) = part.text {
            text.push(t);
        }
        if let Some(data) = part.inline_data {
            generated_images.push(GeneratedImage {
                mime_type: data.mime_type,
                data: data.data,
            });
        }
    }

    if text.is_empty() && generated_images.is_empty() {
        bail!(
            "Gemini returned an empty response (finish reason: {})",
            finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    let format = if text.is_empty() { "image" } else { "markdown" };
    Ok(ProviderOutput {
        content: text.join("\n"),
        format: format.to_string(),
        tokens_used: response.usage_metadata.and_then(|u| u.total_token_count),
        generated_images,
    })
}

// -- predictLongRunning --

#[derive(Debug, Serialize)]
struct VideoRequest {
    instances: Vec<VideoInstance>,
}

#[derive(Debug, Serialize)]
struct VideoInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<VideoImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

fn build_video_request(prompt: &str, image: Option<&StoredImage>) -> VideoRequest {
    VideoRequest {
        instances: vec![VideoInstance {
            prompt: prompt.to_string(),
            image: image.map(|img| VideoImage {
                bytes_base64_encoded: BASE64.encode(&img.buffer),
                mime_type: img.mime_type.clone(),
            }),
        }],
    }
}

/// `Ok(None)` while the operation is still running
fn parse_operation(name: &str, operation: Operation) -> Result<Option<VideoOutput>> {
    if let Some(error) = operation.error {
        bail!("Video generation {} failed: {}", name, error.message);
    }
    if !operation.done {
        return Ok(None);
    }
    let uri = operation
        .response
        .and_then(|r| r.generate_video_response)
        .and_then(|r| r.generated_samples.into_iter().next())
        .and_then(|s| s.video)
        .and_then(|v| v.uri)
        .ok_or_else(|| anyhow!("Video generation {} finished without a video", name))?;
    Ok(Some(VideoOutput {
        operation_name: name.to_string(),
        video_uri: uri,
    }))
}
