use super::providers::BlobStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(rename = "productName")]
    pub product_name: String,
    /// `s3://bucket/key` URIs of curated product footage, in timeline order.
    #[serde(rename = "product_shot_url", default)]
    pub product_shot_urls: Vec<String>,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find(&self, sku: &str) -> Result<Option<Product>>;
}

/// Catalog stored as one JSON object (`{ "<sku>": Product }`) in the blob
/// store. Re-read on every lookup so catalog edits apply to the next job.
pub struct BlobProductCatalog {
    blobs: Arc<dyn BlobStore>,
    key: String,
}

impl BlobProductCatalog {
    pub fn new(blobs: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            blobs,
            key: key.into(),
        }
    }
}

#[async_trait]
impl ProductCatalog for BlobProductCatalog {
    async fn find(&self, sku: &str) -> Result<Option<Product>> {
        let blob = self.blobs.locate(&self.key);
        let raw = self.blobs.fetch(&blob).await?;
        let mut products: HashMap<String, Product> =
            serde_json::from_slice(&raw).with_context(|| format!("Invalid product catalog at {}", blob))?;
        Ok(products.remove(sku))
    }
}
