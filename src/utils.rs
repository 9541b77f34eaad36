//! Utility functions and helpers for promptshop

use anyhow::{Context, Result};
use std::path::Path;

/// Ensure a directory exists, creating it if necessary
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))?;
    }
    Ok(())
}

/// Lowercase ASCII slug, runs of other characters collapsed to a single `-`
pub(crate) fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("image");
    }
    slug
}

/// File name for a generated product image
pub(crate) fn generated_image_name(label: &str, content_id: &str) -> String {
    format!("generated_{}_{}.png", slugify(label), content_id)
}
