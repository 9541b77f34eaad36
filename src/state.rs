use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Mutex;

use crate::core::catalog::ProductCatalog;
use crate::error::{AppError, Result};
use crate::provider::{
    BedrockConfig, BedrockProvider, FakeProvider, Provider, DEFAULT_EMBEDDING_LENGTH,
};

/// Embedding lengths supported by the multimodal embedding model
pub const SUPPORTED_EMBEDDING_LENGTHS: [usize; 3] = [256, 384, 1024];

/// Which [`Provider`] implementation to run against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    /// The hosted Bedrock runtime
    Bedrock,
    /// The deterministic in-process fake
    Fake,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "fake" => Ok(Self::Fake),
            other => Err(AppError::Config(format!("unknown provider: {other}"))),
        }
    }
}

/// Configuration for the application
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Directory generated images are saved to
    pub image_dir: PathBuf,
    /// Embedding length requested from the provider
    pub embedding_length: usize,
    /// Largest `top_k` a search may ask for
    pub max_results: usize,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
    /// Provider implementation
    pub provider: ProviderKind,
    /// Bedrock connection settings
    pub bedrock: BedrockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            image_dir: PathBuf::from("generated"),
            embedding_length: DEFAULT_EMBEDDING_LENGTH,
            max_results: 5,
            max_body_bytes: 1024 * 1024, // 1MB
            provider: ProviderKind::Bedrock,
            bedrock: BedrockConfig::default(),
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key}={value:?}: {e}")))
}

impl Config {
    /// Load configuration from the process environment, reading a `.env`
    /// file first when one is present.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup, falling back to
    /// the defaults for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = var("PROMPTSHOP_BIND") {
            config.bind_addr = parse_var("PROMPTSHOP_BIND", &v)?;
        }
        if let Some(v) = var("PROMPTSHOP_IMAGE_DIR") {
            config.image_dir = PathBuf::from(v);
        }
        if let Some(v) = var("PROMPTSHOP_EMBEDDING_LENGTH") {
            config.embedding_length = parse_var("PROMPTSHOP_EMBEDDING_LENGTH", &v)?;
        }
        if let Some(v) = var("PROMPTSHOP_MAX_RESULTS") {
            config.max_results = parse_var("PROMPTSHOP_MAX_RESULTS", &v)?;
        }
        if let Some(v) = var("PROMPTSHOP_MAX_BODY_BYTES") {
            config.max_body_bytes = parse_var("PROMPTSHOP_MAX_BODY_BYTES", &v)?;
        }
        if let Some(v) = var("PROMPTSHOP_PROVIDER") {
            config.provider = v.parse()?;
        }

        if let Some(v) = var("BEDROCK_REGION").or_else(|| var("AWS_REGION")) {
            config.bedrock.region = v.trim().to_string();
        }
        config.bedrock.endpoint = var("BEDROCK_ENDPOINT");
        config.bedrock.api_key = var("AWS_BEARER_TOKEN_BEDROCK").map(SecretString::from);
        if let Some(v) = var("BEDROCK_TIMEOUT_SECS") {
            config.bedrock.timeout =
                Duration::from_secs(parse_var("BEDROCK_TIMEOUT_SECS", &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_EMBEDDING_LENGTHS.contains(&self.embedding_length) {
            return Err(AppError::Config(format!(
                "embedding length must be one of {:?}, got {}",
                SUPPORTED_EMBEDDING_LENGTHS, self.embedding_length
            )));
        }
        if self.max_results == 0 {
            return Err(AppError::Config("max results must be at least 1".to_string()));
        }
        if self.bedrock.timeout.is_zero() {
            return Err(AppError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Application state that can be shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Remote model provider
    pub provider: Arc<dyn Provider>,
    /// The session's product catalog. Held for the whole of a product action
    /// so actions run one at a time.
    pub catalog: Mutex<ProductCatalog>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create application state with an explicit provider
    pub fn new(config: Config, provider: Arc<dyn Provider>) -> Result<Arc<Self>> {
        let catalog = ProductCatalog::new(config.image_dir.clone(), config.embedding_length)?;

        Ok(Arc::new(Self {
            config,
            provider,
            catalog: Mutex::new(catalog),
        }))
    }

    /// Create application state with the provider named in the configuration
    pub fn from_config(config: Config) -> Result<Arc<Self>> {
        let provider: Arc<dyn Provider> = match config.provider {
            ProviderKind::Bedrock => {
                if config.bedrock.api_key.is_none() {
                    log::warn!("AWS_BEARER_TOKEN_BEDROCK is not set; requests will be unauthenticated");
                }
                Arc::new(BedrockProvider::new(config.bedrock.clone())?)
            }
            ProviderKind::Fake => Arc::new(FakeProvider::new()),
        };
        log::info!("Using {} provider", provider.name());

        Self::new(config, provider)
    }
}
