//! Remote model provider trait and supporting types.
//!
//! Text generation, image generation and embedding extraction all happen on a
//! hosted inference service. The pipelines only see the [`Provider`] trait so
//! they can run against [`BedrockProvider`] in production and
//! [`FakeProvider`] in tests.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bedrock;
pub mod fake;

pub use bedrock::{BedrockConfig, BedrockProvider};
pub use fake::FakeProvider;

/// Errors returned by a [`Provider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller is not allowed to invoke the model
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Message reported by the service.
        message: String,
    },

    /// Any other non-success response
    #[error("API error: {status} {}: {message}", .code.as_deref().unwrap_or("unknown"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Service error type, when reported.
        code: Option<String>,
        /// Message reported by the service.
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The request could not be built from the given input
    #[error("Invalid provider input: {0}")]
    InvalidInput(String),

    /// An image payload was not valid base64
    #[error("Invalid image payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Sampling parameters for text generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextGenerationConfig {
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Sampling temperature (lower is more deterministic).
    pub temperature: f32,
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            top_p: 0.95,
            temperature: 0.1,
        }
    }
}

/// Parameters for image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationConfig {
    /// How many images to generate for one prompt
    pub number_of_images: u32,
    /// `"standard"` or `"premium"`
    pub quality: String,
    /// Height in pixels
    pub height: u32,
    /// Width in pixels
    pub width: u32,
    /// Prompt adherence
    pub cfg_scale: f32,
    /// Fixed seed for repeatable output
    pub seed: u64,
}

impl Default for ImageGenerationConfig {
    fn default() -> Self {
        Self {
            number_of_images: 1,
            quality: "premium".to_string(),
            height: 1024,
            width: 1024,
            cfg_scale: 10.0,
            seed: 2024,
        }
    }
}

/// A text-to-image request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    /// Prompt describing the image
    pub prompt: String,
    /// Generation parameters
    pub config: ImageGenerationConfig,
}

impl ImageRequest {
    /// Request with the default generation parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            config: ImageGenerationConfig::default(),
        }
    }

    /// Overrides the generation parameters.
    pub fn with_config(mut self, config: ImageGenerationConfig) -> Self {
        self.config = config;
        self
    }
}

/// Default embedding length requested from the provider.
pub const DEFAULT_EMBEDDING_LENGTH: usize = 1024;

/// Input to a multimodal embedding call: an image, a text, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingInput {
    /// Raw image bytes
    pub image: Option<Bytes>,
    /// Text description
    pub text: Option<String>,
    /// Requested embedding length
    pub output_length: usize,
}

impl EmbeddingInput {
    /// Embedding of an image.
    pub fn image(image: impl Into<Bytes>) -> Self {
        Self {
            image: Some(image.into()),
            text: None,
            output_length: DEFAULT_EMBEDDING_LENGTH,
        }
    }

    /// Embedding of a text description.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            image: None,
            text: Some(text.into()),
            output_length: DEFAULT_EMBEDDING_LENGTH,
        }
    }

    /// Adds a text description to the input.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the requested embedding length.
    pub fn with_output_length(mut self, output_length: usize) -> Self {
        self.output_length = output_length;
        self
    }

    /// Checks that at least one of image or text is present.
    pub fn validate(&self) -> ProviderResult<()> {
        let has_image = self.image.as_ref().is_some_and(|b| !b.is_empty());
        let has_text = self.text.as_ref().is_some_and(|t| !t.is_empty());
        if has_image || has_text {
            Ok(())
        } else {
            Err(ProviderError::InvalidInput(
                "please provide either an image and/or a text description".to_string(),
            ))
        }
    }
}

/// A hosted generative model service.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name for logs (e.g. "bedrock", "fake").
    fn name(&self) -> &str;

    /// Generates text for a prompt.
    async fn generate_text(
        &self,
        prompt: &str,
        config: &TextGenerationConfig,
    ) -> ProviderResult<String>;

    /// Generates images, returned as raw encoded image bytes.
    async fn generate_images(&self, request: &ImageRequest) -> ProviderResult<Vec<Bytes>>;

    /// Computes a multimodal embedding.
    async fn embed(&self, input: &EmbeddingInput) -> ProviderResult<Vec<f32>>;
}
