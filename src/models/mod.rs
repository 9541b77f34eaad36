//! Request and response types shared by the pipelines and the HTTP API

/// Customer-service email drafts.
pub mod email;
/// Product options, generated images and search hits.
pub mod product;
