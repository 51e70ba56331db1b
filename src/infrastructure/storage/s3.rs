use crate::modules::pipeline::providers::{BlobRef, BlobStore};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::BehaviorVersion, config::Credentials, config::Region, Client};
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
}

impl StorageService {
    pub fn new(
        endpoint: &str,
        region: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("✅ S3 client ready for bucket {}", bucket);

        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for StorageService {
    fn locate(&self, key: &str) -> BlobRef {
        BlobRef::new(&self.bucket, key)
    }

    async fn store(&self, key: &str, body: Bytes, content_type: &str) -> Result<BlobRef> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to upload {}: {}", key, e))?;

        debug!(key, size, content_type, "Uploaded object");
        Ok(self.locate(key))
    }

    async fn fetch(&self, blob: &BlobRef) -> Result<Bytes> {
        let object = self
            .client
            .get_object()
            .bucket(&blob.bucket)
            .key(&blob.key)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to download {}: {}", blob, e))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("Failed to read {}: {}", blob, e))?;

        Ok(data.into_bytes())
    }

    async fn presign(&self, blob: &BlobRef, ttl: Duration) -> Result<String> {
        let config = PresigningConfig::expires_in(ttl)
            .map_err(|e| anyhow!("Invalid presign expiry: {}", e))?;

        let request = self
            .client
            .get_object()
            .bucket(&blob.bucket)
            .key(&blob.key)
            .presigned(config)
            .await
            .map_err(|e| anyhow!("Failed to presign {}: {}", blob, e))?;

        Ok(request.uri().to_string())
    }
}
