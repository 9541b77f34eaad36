//! Deterministic in-process provider.
//!
//! Useful for testing and offline runs without making API calls. Images are
//! solid-colour PNGs whose colour is derived from the prompt, and embeddings
//! encode that same colour, so a text query equal to a generation prompt
//! lands at distance zero from the generated image.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use super::{
    EmbeddingInput, ImageRequest, Provider, ProviderError, ProviderResult, TextGenerationConfig,
};
use crate::core::hash::compute_sha3_256;

const IMAGE_SIDE: u32 = 8;

/// Deterministic [`Provider`] for tests.
#[derive(Debug, Default)]
pub struct FakeProvider {
    canned: HashMap<String, Vec<f32>>,
    fail_text: AtomicBool,
    fail_images: AtomicBool,
    fail_embeddings: AtomicBool,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
    embed_calls: AtomicUsize,
}

impl FakeProvider {
    /// Create a new fake provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `embedding` verbatim for text-only inputs equal to `text`.
    pub fn with_text_embedding(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.canned.insert(text.into(), embedding);
        self
    }

    /// Make text generation fail with an access-denied error.
    pub fn set_fail_text(&self, fail: bool) {
        self.fail_text.store(fail, Ordering::SeqCst);
    }

    /// Make image generation fail with an access-denied error.
    pub fn set_fail_images(&self, fail: bool) {
        self.fail_images.store(fail, Ordering::SeqCst);
    }

    /// Make embedding calls fail with an access-denied error.
    pub fn set_fail_embeddings(&self, fail: bool) {
        self.fail_embeddings.store(fail, Ordering::SeqCst);
    }

    /// Number of `generate_text` calls so far
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    /// Number of `generate_images` calls so far
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Number of `embed` calls so far
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Colour the fake generator uses for a prompt. Channels are never zero.
    pub fn prompt_color(prompt: &str) -> [u8; 3] {
        let digest = compute_sha3_256(prompt.as_bytes());
        let mut color = [0u8; 3];
        for (i, channel) in color.iter_mut().enumerate() {
            let byte = u8::from_str_radix(&digest[i * 2..i * 2 + 2], 16).unwrap_or(0);
            *channel = byte.max(1);
        }
        color
    }

    fn denied(what: &str) -> ProviderError {
        ProviderError::AccessDenied {
            message: format!("fake provider refused {what}"),
        }
    }

    fn color_embedding(color: [f32; 3], length: usize) -> Vec<f32> {
        let mut embedding = vec![0.0; length];
        for (i, value) in color.iter().enumerate() {
            embedding[i % length] += value / 255.0;
        }
        embedding
    }

    fn mean_color(raw: &[u8]) -> ProviderResult<[f32; 3]> {
        let img = image::load_from_memory(raw)
            .map_err(|e| ProviderError::InvalidInput(format!("unreadable image: {e}")))?
            .to_rgb8();

        let pixels = (img.width() * img.height()).max(1) as f32;
        let mut sum = [0.0f32; 3];
        for pixel in img.pixels() {
            for (acc, channel) in sum.iter_mut().zip(pixel.0) {
                *acc += f32::from(channel);
            }
        }
        Ok(sum.map(|s| s / pixels))
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate_text(
        &self,
        prompt: &str,
        _config: &TextGenerationConfig,
    ) -> ProviderResult<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_text.load(Ordering::SeqCst) {
            return Err(Self::denied("text generation"));
        }
        Ok(format!("Generated reply for:\n{}", prompt.trim()))
    }

    async fn generate_images(&self, request: &ImageRequest) -> ProviderResult<Vec<Bytes>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_images.load(Ordering::SeqCst) {
            return Err(Self::denied("image generation"));
        }

        (0..request.config.number_of_images.max(1))
            .map(|i| -> ProviderResult<Bytes> {
                let seed = if i == 0 {
                    request.prompt.clone()
                } else {
                    format!("{}#{}", request.prompt, i)
                };
                let img = RgbImage::from_pixel(IMAGE_SIDE, IMAGE_SIDE, Rgb(Self::prompt_color(&seed)));

                let mut buf = Cursor::new(Vec::new());
                DynamicImage::ImageRgb8(img)
                    .write_to(&mut buf, ImageOutputFormat::Png)
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
                Ok(Bytes::from(buf.into_inner()))
            })
            .collect()
    }

    async fn embed(&self, input: &EmbeddingInput) -> ProviderResult<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embeddings.load(Ordering::SeqCst) {
            return Err(Self::denied("embedding"));
        }
        input.validate()?;
        if input.output_length == 0 {
            return Err(ProviderError::InvalidInput(
                "embedding length must be positive".to_string(),
            ));
        }

        let text = input.text.as_deref().filter(|t| !t.is_empty());
        let image = input.image.as_ref().filter(|b| !b.is_empty());

        if let (Some(text), None) = (text, image) {
            if let Some(embedding) = self.canned.get(text) {
                return Ok(embedding.clone());
            }
        }

        let mut colors = Vec::with_capacity(2);
        if let Some(text) = text {
            colors.push(Self::prompt_color(text).map(f32::from));
        }
        if let Some(image) = image {
            colors.push(Self::mean_color(image)?);
        }

        let count = colors.len() as f32;
        let mut color = [0.0f32; 3];
        for c in &colors {
            for (acc, v) in color.iter_mut().zip(c) {
                *acc += v / count;
            }
        }

        Ok(Self::color_embedding(color, input.output_length))
    }
}
