use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use spill_core::{BlobClient, BlobError};
use tracing::{debug, error, instrument};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::classify_sdk_error;

/// Content type stamped on every offloaded object.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Configuration for the S3 blob collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Shared AWS connection settings.
    #[serde(flatten)]
    pub aws: AwsBaseConfig,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// User metadata attached to every object.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_owned()
}

impl Default for S3Config {
    fn default() -> Self {
        Self::new(AwsBaseConfig::default())
    }
}

impl S3Config {
    pub fn new(aws: AwsBaseConfig) -> Self {
        Self {
            aws,
            content_type: default_content_type(),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Stores offloaded bodies with S3 `PutObject`.
pub struct S3BlobStore {
    config: S3Config,
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("config", &self.config)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3BlobStore {
    /// Build an S3 client from `config`.
    pub async fn new(config: S3Config) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let client = aws_sdk_s3::Client::new(&sdk_config);
        Self { config, client }
    }

    /// Wrap an already-built client.
    pub fn with_client(config: S3Config, client: aws_sdk_s3::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl BlobClient for S3BlobStore {
    #[instrument(skip(self, payload), fields(collaborator = "aws-s3"))]
    async fn put(&self, container: &str, key: &str, payload: &str) -> Result<(), BlobError> {
        let mut request = self
            .client
            .put_object()
            .bucket(container)
            .key(key)
            .content_type(self.config.content_type.as_str())
            .body(ByteStream::from(payload.as_bytes().to_vec()));

        for (name, value) in &self.config.metadata {
            request = request.metadata(name, value);
        }

        debug!(bytes = payload.len(), "writing S3 object");

        request.send().await.map_err(|e| {
            let err_str = DisplayErrorContext(&e).to_string();
            error!(error = %err_str, "S3 put_object failed");
            BlobError::from(classify_sdk_error(&err_str))
        })?;

        Ok(())
    }
}
