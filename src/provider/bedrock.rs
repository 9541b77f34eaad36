//! Provider for the hosted Bedrock runtime.
//!
//! Every model is invoked with `POST {endpoint}/model/{model_id}/invoke` and a
//! model-specific JSON body. Requests authenticate with a Bedrock API key sent
//! as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::*;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{
    EmbeddingInput, ImageGenerationConfig, ImageRequest, Provider, ProviderError, ProviderResult,
    TextGenerationConfig,
};

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-west-2";
/// Default text generation model.
pub const DEFAULT_TEXT_MODEL: &str = "amazon.titan-tg1-large";
/// Default image generation model.
pub const DEFAULT_IMAGE_MODEL: &str = "amazon.titan-image-generator-v1";
/// Default multimodal embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-image-v1";

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Connection settings for [`BedrockProvider`].
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    /// AWS region, used to derive the default endpoint
    pub region: String,
    /// Explicit endpoint, overriding the regional default
    pub endpoint: Option<String>,
    /// Bedrock API key
    pub api_key: Option<SecretString>,
    /// Model used for email drafting
    pub text_model_id: String,
    /// Model used for product images
    pub image_model_id: String,
    /// Model used for multimodal embeddings
    pub embedding_model_id: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            api_key: None,
            text_model_id: DEFAULT_TEXT_MODEL.to_string(),
            image_model_id: DEFAULT_IMAGE_MODEL.to_string(),
            embedding_model_id: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl BedrockConfig {
    /// The endpoint requests are sent to, without a trailing slash.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

// Request and response bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextRequest<'a> {
    input_text: &'a str,
    text_generation_config: &'a TextGenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextResponse {
    #[serde(default)]
    results: Vec<TextResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextResult {
    output_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextToImageRequest<'a> {
    task_type: &'static str,
    text_to_image_params: TextToImageParams<'a>,
    image_generation_config: &'a ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
struct TextToImageParams<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    input_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_text: Option<&'a str>,
    embedding_config: EmbeddingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingConfig {
    output_embedding_length: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// [`Provider`] backed by the Bedrock runtime HTTP API.
#[derive(Debug, Clone)]
pub struct BedrockProvider {
    client: reqwest::Client,
    config: BedrockConfig,
    endpoint: String,
}

impl BedrockProvider {
    /// Create a new provider.
    pub fn new(config: BedrockConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let endpoint = config.endpoint_url();

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// The connection settings in use
    pub fn config(&self) -> &BedrockConfig {
        &self.config
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.config.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret())) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    async fn invoke<B, R>(&self, model_id: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/model/{}/invoke", self.endpoint, model_id);
        log::debug!("Invoking model {model_id}");

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = Self::error_from_response(response).await;
            log::warn!("Model {model_id} invocation failed: {error}");
            return Err(error);
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let code = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(':').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let message = response
            .json::<ErrorBody>()
            .await
            .unwrap_or_default()
            .message
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status == 403 || code.as_deref() == Some("AccessDeniedException") {
            return ProviderError::AccessDenied { message };
        }

        ProviderError::Api {
            status,
            code,
            message,
        }
    }
}

#[async_trait]
impl Provider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn generate_text(
        &self,
        prompt: &str,
        config: &TextGenerationConfig,
    ) -> ProviderResult<String> {
        let body = TextRequest {
            input_text: prompt,
            text_generation_config: config,
        };

        let response: TextResponse = self.invoke(&self.config.text_model_id, &body).await?;

        response
            .results
            .into_iter()
            .next()
            .map(|r| r.output_text)
            .ok_or_else(|| ProviderError::InvalidResponse("No results in response".to_string()))
    }

    async fn generate_images(&self, request: &ImageRequest) -> ProviderResult<Vec<Bytes>> {
        let body = TextToImageRequest {
            task_type: "TEXT_IMAGE",
            text_to_image_params: TextToImageParams {
                text: &request.prompt,
            },
            image_generation_config: &request.config,
        };

        let response: ImageResponse = self.invoke(&self.config.image_model_id, &body).await?;
        if response.images.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No images in response".to_string(),
            ));
        }

        response
            .images
            .iter()
            .map(|encoded| -> ProviderResult<Bytes> {
                Ok(Bytes::from(BASE64_STANDARD.decode(encoded)?))
            })
            .collect()
    }

    async fn embed(&self, input: &EmbeddingInput) -> ProviderResult<Vec<f32>> {
        input.validate()?;

        let body = EmbeddingRequest {
            input_image: input.image.as_ref().map(|img| BASE64_STANDARD.encode(img)),
            input_text: input.text.as_deref(),
            embedding_config: EmbeddingConfig {
                output_embedding_length: input.output_length,
            },
        };

        let response: EmbeddingResponse =
            self.invoke(&self.config.embedding_model_id, &body).await?;
        Ok(response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let config = BedrockConfig::default();
        assert_eq!(
            config.endpoint_url(),
            "https://bedrock-runtime.us-west-2.amazonaws.com"
        );

        let config = BedrockConfig {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..BedrockConfig::default()
        };
        assert_eq!(config.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn test_text_request_body() {
        let config = TextGenerationConfig::default();
        let body = serde_json::to_value(TextRequest {
            input_text: "hello",
            text_generation_config: &config,
        })
        .unwrap();

        assert_eq!(body["inputText"], "hello");
        assert!(body["textGenerationConfig"]["topP"].is_number());
        assert!(body["textGenerationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_image_request_body() {
        let config = ImageGenerationConfig::default();
        let body = serde_json::to_value(TextToImageRequest {
            task_type: "TEXT_IMAGE",
            text_to_image_params: TextToImageParams { text: "Backpack" },
            image_generation_config: &config,
        })
        .unwrap();

        assert_eq!(body["taskType"], "TEXT_IMAGE");
        assert_eq!(body["textToImageParams"]["text"], "Backpack");
        assert_eq!(body["imageGenerationConfig"]["numberOfImages"], 1);
        assert_eq!(body["imageGenerationConfig"]["seed"], 2024);
    }

    #[test]
    fn test_embedding_request_body_skips_missing_fields() {
        let body = serde_json::to_value(EmbeddingRequest {
            input_image: None,
            input_text: Some("red sneakers"),
            embedding_config: EmbeddingConfig {
                output_embedding_length: 384,
            },
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "inputText": "red sneakers",
                "embeddingConfig": { "outputEmbeddingLength": 384 }
            })
        );
    }

    #[test]
    fn test_error_body_accepts_both_casings() {
        let lower: ErrorBody = serde_json::from_str(r#"{"message": "nope"}"#).unwrap();
        let upper: ErrorBody = serde_json::from_str(r#"{"Message": "nope"}"#).unwrap();
        assert_eq!(lower.message.as_deref(), Some("nope"));
        assert_eq!(upper.message.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_input_without_network() {
        let provider = BedrockProvider::new(BedrockConfig {
            endpoint: Some("http://127.0.0.1:1".to_string()),
            ..BedrockConfig::default()
        })
        .unwrap();

        let input = EmbeddingInput::text("");
        let err = provider.embed(&input).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }
}
