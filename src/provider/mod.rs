//! Generative-AI provider
//!
//! The analysis pipeline only knows this narrow interface: send a prompt plus
//! images and get content back, or start a video generation and wait for its
//! result. `GeminiProvider` talks to the Google Generative Language REST API.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{GeneratedImage, StoredImage};

pub use gemini::GeminiProvider;

/// Output of one analysis call
#[derive(Debug, Clone, Default)]
pub struct ProviderOutput {
    pub content: String,
    pub format: String,
    pub tokens_used: Option<u64>,
    pub generated_images: Vec<GeneratedImage>,
}

/// Output of a finished video generation
#[derive(Debug, Clone)]
pub struct VideoOutput {
    pub operation_name: String,
    pub video_uri: String,
}

/// External analysis collaborator
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Analyze or edit images according to `prompt`
    async fn analyze(&self, prompt: &str, images: &[Arc<StoredImage>]) -> Result<ProviderOutput>;

    /// Generate a video, optionally seeded with an image, and wait for it to finish
    async fn generate_video(&self, prompt: &str, image: Option<&StoredImage>) -> Result<VideoOutput>;
}

/// Provider used when no API key is configured; every call fails
pub struct UnconfiguredProvider;

#[async_trait]
impl AnalysisProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn analyze(&self, _prompt: &str, _images: &[Arc<StoredImage>]) -> Result<ProviderOutput> {
        anyhow::bail!("No provider API key configured (set GEMINI_API_KEY)")
    }

    async fn generate_video(&self, _prompt: &str, _image: Option<&StoredImage>) -> Result<VideoOutput> {
        anyhow::bail!("No provider API key configured (set GEMINI_API_KEY)")
    }
}

/// Build the provider described by the configuration
pub fn create_provider(config: &crate::config::ProviderConfig) -> Result<Arc<dyn AnalysisProvider>> {
    match config.api_key.as_deref() {
        Some(key) => Ok(Arc::new(GeminiProvider::from_config(key, config)?)),
        None => {
            tracing::warn!("No provider API key configured; analysis requests will fail");
            Ok(Arc::new(UnconfiguredProvider))
        }
    }
}
