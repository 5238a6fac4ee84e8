use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use spill_aws::{AwsBaseConfig, S3Config, SqsConfig};
use spill_core::DispatcherConfig;

/// Layout of the `spill.toml` file.
///
/// ```toml
/// [dispatcher]
/// queue_url = "https://sqs.us-east-1.amazonaws.com/123456789012/orders"
/// bucket = "orders-overflow"
///
/// [aws]
/// region = "us-east-1"
///
/// [sqs]
/// message_group_id = "orders"
///
/// [s3]
/// content_type = "application/json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub aws: AwsBaseConfig,
    #[serde(default)]
    pub sqs: QueueSettings,
    #[serde(default)]
    pub s3: BlobSettings,
}

/// Per-message SQS options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSettings {
    pub message_group_id: Option<String>,
    pub delay_seconds: Option<i32>,
}

/// Per-object S3 options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlobSettings {
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(source: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn sqs_config(&self) -> SqsConfig {
        let mut config = SqsConfig::new(self.aws.clone());
        config.message_group_id.clone_from(&self.sqs.message_group_id);
        config.delay_seconds = self.sqs.delay_seconds;
        config
    }

    pub fn s3_config(&self) -> S3Config {
        let mut config = S3Config::new(self.aws.clone());
        if let Some(content_type) = &self.s3.content_type {
            config.content_type.clone_from(content_type);
        }
        config.metadata.clone_from(&self.s3.metadata);
        config
    }
}
