//! The product session: generated images and their embeddings.
//!
//! A [`ProductCatalog`] owns the embedding store for one session. Generating a
//! product saves each returned image, embeds it and appends the embedding;
//! searching embeds the query text and ranks the stored images.

use std::path::{Path, PathBuf};

use crate::core::images;
use crate::core::search::{EmbeddingRecord, EmbeddingStore, SearchError};
use crate::error::{AppError, Result};
use crate::models::product::{image_url, GeneratedProduct, ProductHit, ProductKind};
use crate::provider::{EmbeddingInput, ImageRequest, Provider};

/// Generated product images and their embeddings for one session.
#[derive(Debug)]
pub struct ProductCatalog {
    store: EmbeddingStore,
    image_dir: PathBuf,
    embedding_length: usize,
}

impl ProductCatalog {
    /// Create an empty catalog saving images under `image_dir`.
    ///
    /// Every embedding is requested with `embedding_length` values and the
    /// store enforces that dimension.
    pub fn new(image_dir: impl Into<PathBuf>, embedding_length: usize) -> Result<Self> {
        Ok(Self {
            store: EmbeddingStore::with_dimension(embedding_length)?,
            image_dir: image_dir.into(),
            embedding_length,
        })
    }

    /// The underlying embedding store
    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Directory generated images are written to
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Number of indexed images
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no image has been indexed yet
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Generate images for a product, save them and index their embeddings.
    ///
    /// Images are handled in order. If an embedding call fails, the error is
    /// returned and nothing is appended for that image; images handled before
    /// it stay indexed.
    pub async fn generate(
        &mut self,
        provider: &dyn Provider,
        product: ProductKind,
        description: Option<&str>,
    ) -> Result<Vec<GeneratedProduct>> {
        let prompt = product.prompt(description);
        log::info!("Generating product images for \"{prompt}\" via {}", provider.name());

        let raw_images = provider.generate_images(&ImageRequest::new(prompt)).await?;

        let mut generated = Vec::with_capacity(raw_images.len());
        for raw in raw_images {
            // PNG re-encoding of full-size images is CPU bound
            let dir = self.image_dir.clone();
            let saved = tokio::task::spawn_blocking(move || {
                images::save_generated(&dir, product.label(), &raw)
            })
            .await??;

            let input = EmbeddingInput::image(saved.png.clone())
                .with_output_length(self.embedding_length);
            let vector = provider.embed(&input).await?;

            self.store
                .append(EmbeddingRecord::new(saved.file_name.clone(), vector))?;
            log::info!(
                "Image generated and saved as {} ({} indexed)",
                saved.path.display(),
                self.store.len()
            );

            generated.push(GeneratedProduct::new(saved.file_name, product));
        }

        Ok(generated)
    }

    /// Find the `top_k` indexed images closest to a text query.
    ///
    /// An empty catalog fails before the provider is called.
    pub async fn search(
        &self,
        provider: &dyn Provider,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ProductHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Please enter a search query.".to_string(),
            ));
        }
        if self.store.is_empty() {
            return Err(SearchError::EmptyStore.into());
        }

        let input = EmbeddingInput::text(query).with_output_length(self.embedding_length);
        let vector = provider.embed(&input).await?;

        let hits = self.store.query(&vector, top_k)?;
        log::info!("Search for \"{query}\" returned {} of {} images", hits.len(), self.store.len());

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| {
                log::debug!("#{} {} cosine distance {:.4}", i + 1, hit.record.id, hit.distance);
                ProductHit {
                    rank: i + 1,
                    id: hit.record.id.clone(),
                    url: image_url(&hit.record.id),
                    distance: hit.distance,
                }
            })
            .collect())
    }
}
