#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

//! # promptshop
//!
//! Two small generative-AI demos served from one binary, backed by a hosted
//! model API:
//!
//! - **Email Generator**: drafts a customer-service reply to negative feedback
//!   from a customer name and the feedback text.
//! - **Product Generator & Search**: generates product images, embeds them with
//!   a multimodal embedding model and finds the images closest to a text query
//!   by cosine distance.
//!
//! ## Features
//!
//! - **Vector Search**: append-only [`EmbeddingStore`] with brute-force top-k
//!   queries, stable tie-breaking and a defined zero-vector policy
//! - **Providers**: the [`Provider`] trait with a Bedrock HTTP client and a
//!   deterministic fake for tests
//! - **Web API**: HTTP server with the demo page and JSON endpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptshop::{EmbeddingRecord, EmbeddingStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = EmbeddingStore::new();
//!     store.append(EmbeddingRecord::new("A", vec![1.0, 0.0]))?;
//!     store.append(EmbeddingRecord::new("B", vec![0.0, 1.0]))?;
//!
//!     for hit in store.query(&[0.9, 0.1], 1)? {
//!         println!("{} at distance {:.4}", hit.record.id, hit.distance);
//!     }
//!     Ok(())
//! }
//! ```

// Internal modules
pub mod api;
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
pub mod models;
pub mod provider;
mod state;
mod utils;

/// Version and build time recorded by the build script.
#[allow(missing_docs, dead_code, unreachable_pub)]
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

// Public API exports
pub use crate::{
    core::{
        catalog::ProductCatalog,
        email::draft_email,
        search::{EmbeddingRecord, EmbeddingStore, SearchError, SearchHit},
    },
    error::{AppError, Result, ResultExt},
    models::{
        email::{EmailDraft, EmailDraftRequest},
        product::{GeneratedProduct, ProductHit, ProductKind},
    },
    provider::{
        BedrockConfig, BedrockProvider, EmbeddingInput, FakeProvider, ImageRequest, Provider,
        ProviderError,
    },
    state::{AppState, Config, ProviderKind},
};

#[cfg(feature = "web")]
pub use crate::api::{create_router, health_check};

/// Initialize the application with default settings
///
/// This sets up logging. It should be called early in the application
/// startup process.
///
/// # Errors
///
/// Returns an error if a global logger is already installed.
///
/// # Example
///
/// ```no_run
/// use promptshop::init;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     init()?;
///     // Application code here
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    // Initialize logging with sensible defaults
    let env = env_logger::Env::default()
        .default_filter_or("info")
        .default_write_style_or("auto");

    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_module_path(false)
        .format_target(false)
        .try_init()
        .map_err(|e| AppError::Config(format!("logger: {}", e)))?;

    log::info!(
        "Initializing promptshop {} (built {})",
        build_info::PKG_VERSION,
        build_info::BUILT_TIME_UTC
    );

    Ok(())
}
