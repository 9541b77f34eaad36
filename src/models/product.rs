use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// URL prefix under which saved product images are served.
pub const IMAGE_ROUTE: &str = "/images";

/// The products offered by the product generator form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    /// A T-shirt.
    #[serde(rename = "T-shirt")]
    TShirt,
    /// A pair of jeans.
    #[serde(rename = "Jeans")]
    Jeans,
    /// Sneakers.
    #[serde(rename = "Sneakers")]
    Sneakers,
    /// A backpack.
    #[serde(rename = "Backpack")]
    Backpack,
    /// A smartwatch.
    #[serde(rename = "Smartwatch")]
    Smartwatch,
    /// A coffee maker.
    #[serde(rename = "Coffee maker")]
    CoffeeMaker,
    /// A yoga mat.
    #[serde(rename = "Yoga mat")]
    YogaMat,
}

impl ProductKind {
    /// Every product, in form order.
    pub const ALL: [ProductKind; 7] = [
        ProductKind::TShirt,
        ProductKind::Jeans,
        ProductKind::Sneakers,
        ProductKind::Backpack,
        ProductKind::Smartwatch,
        ProductKind::CoffeeMaker,
        ProductKind::YogaMat,
    ];

    /// Label shown in the form and used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            ProductKind::TShirt => "T-shirt",
            ProductKind::Jeans => "Jeans",
            ProductKind::Sneakers => "Sneakers",
            ProductKind::Backpack => "Backpack",
            ProductKind::Smartwatch => "Smartwatch",
            ProductKind::CoffeeMaker => "Coffee maker",
            ProductKind::YogaMat => "Yoga mat",
        }
    }

    /// Image prompt: `"<label>: <description>"`, or just the label when the
    /// description is blank.
    pub fn prompt(self, description: Option<&str>) -> String {
        match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(description) => format!("{}: {}", self.label(), description),
            None => self.label().to_string(),
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductKind::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown product: {s}")))
    }
}

/// URL of a saved image
pub fn image_url(id: &str) -> String {
    format!("{IMAGE_ROUTE}/{id}")
}

/// A generated product image that was saved and indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProduct {
    /// Embedding id, which is also the saved file name
    pub id: String,
    /// The product the image was generated for
    pub product: ProductKind,
    /// Where the image is served
    pub url: String,
}

impl GeneratedProduct {
    /// Creates the entry for a saved image.
    pub fn new(id: impl Into<String>, product: ProductKind) -> Self {
        let id = id.into();
        let url = image_url(&id);
        Self { id, product, url }
    }
}

/// One product search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHit {
    /// 1-based rank
    pub rank: usize,
    /// Embedding id of the matched image
    pub id: String,
    /// Where the image is served
    pub url: String,
    /// Cosine distance to the query
    pub distance: f32,
}

/// Body of a product generation request.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Product to generate
    pub product: ProductKind,
    /// Optional extra description
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of a product search request.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,
    /// Number of results, defaults to 1
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_serde() {
        for product in ProductKind::ALL {
            let json = serde_json::to_string(&product).unwrap();
            assert_eq!(json, format!("\"{}\"", product.label()));
            assert_eq!(serde_json::from_str::<ProductKind>(&json).unwrap(), product);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("coffee maker".parse::<ProductKind>().unwrap(), ProductKind::CoffeeMaker);
        assert_eq!(" T-shirt ".parse::<ProductKind>().unwrap(), ProductKind::TShirt);
        assert!("Toaster".parse::<ProductKind>().is_err());
    }

    #[test]
    fn test_prompt() {
        assert_eq!(ProductKind::Sneakers.prompt(None), "Sneakers");
        assert_eq!(ProductKind::Sneakers.prompt(Some("   ")), "Sneakers");
        assert_eq!(
            ProductKind::Sneakers.prompt(Some(" red, high-top ")),
            "Sneakers: red, high-top"
        );
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "bag"}"#).unwrap();
        assert_eq!(req.top_k, 1);
    }

    #[test]
    fn test_generated_product_url() {
        let product = GeneratedProduct::new("generated_jeans_abc.png", ProductKind::Jeans);
        assert_eq!(product.url, "/images/generated_jeans_abc.png");
    }
}
