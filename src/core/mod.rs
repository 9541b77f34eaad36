//! Core functionality: vector search and the two demo pipelines

/// The product session that ties image generation to vector search.
pub mod catalog;
/// Customer-service email drafting.
pub mod email;
/// Cosine similarity and distance between embeddings.
pub mod embeddings;
/// Content hashing for saved images.
pub mod hash;
/// Decoding and saving generated images.
pub mod images;
pub mod search;
