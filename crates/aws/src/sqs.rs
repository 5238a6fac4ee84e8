use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::MessageAttributeValue;
use serde::{Deserialize, Serialize};
use spill_core::{MessageAttribute, MessageAttributes, QueueAck, QueueClient, QueueError};
use tracing::{debug, error, instrument};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::classify_sdk_error;

/// Configuration for the SQS queue collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqsConfig {
    /// Shared AWS connection settings.
    #[serde(flatten)]
    pub aws: AwsBaseConfig,

    /// Message group for FIFO queues. Applied to every message.
    #[serde(default)]
    pub message_group_id: Option<String>,

    /// Delivery delay in seconds (0-900) applied to every message.
    #[serde(default)]
    pub delay_seconds: Option<i32>,
}

impl SqsConfig {
    pub fn new(aws: AwsBaseConfig) -> Self {
        Self {
            aws,
            message_group_id: None,
            delay_seconds: None,
        }
    }

    #[must_use]
    pub fn with_message_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.message_group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn with_delay_seconds(mut self, delay_seconds: i32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }
}

/// Sends dispatcher payloads with SQS `SendMessage`.
pub struct SqsQueue {
    config: SqsConfig,
    client: aws_sdk_sqs::Client,
}

impl std::fmt::Debug for SqsQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsQueue")
            .field("config", &self.config)
            .field("client", &"<SqsClient>")
            .finish()
    }
}

impl SqsQueue {
    /// Build an SQS client from `config`.
    pub async fn new(config: SqsConfig) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let client = aws_sdk_sqs::Client::new(&sdk_config);
        Self { config, client }
    }

    /// Wrap an already-built client.
    pub fn with_client(config: SqsConfig, client: aws_sdk_sqs::Client) -> Self {
        Self { config, client }
    }
}

/// Convert a dispatcher attribute into its SQS representation.
pub fn to_sqs_attribute(attribute: &MessageAttribute) -> Result<MessageAttributeValue, QueueError> {
    let mut value = MessageAttributeValue::builder().data_type(attribute.data_type.as_str());
    if let Some(text) = &attribute.string_value {
        value = value.string_value(text.as_str());
    }
    if let Some(binary) = &attribute.binary_value {
        value = value.binary_value(Blob::new(binary.to_bytes().to_vec()));
    }
    value
        .build()
        .map_err(|e| QueueError::Rejected(e.to_string()))
}

#[async_trait]
impl QueueClient for SqsQueue {
    #[instrument(skip(self, payload, attributes), fields(collaborator = "aws-sqs"))]
    async fn send(
        &self,
        endpoint: &str,
        payload: &str,
        attributes: &MessageAttributes,
    ) -> Result<QueueAck, QueueError> {
        let mut request = self
            .client
            .send_message()
            .queue_url(endpoint)
            .message_body(payload);

        if let Some(delay) = self.config.delay_seconds {
            request = request.delay_seconds(delay);
        }
        if let Some(group_id) = &self.config.message_group_id {
            request = request.message_group_id(group_id);
        }
        for (name, attribute) in attributes {
            request = request.message_attributes(name, to_sqs_attribute(attribute)?);
        }

        debug!(bytes = payload.len(), attributes = attributes.len(), "sending SQS message");

        let output = request.send().await.map_err(|e| {
            let err_str = DisplayErrorContext(&e).to_string();
            error!(error = %err_str, "SQS send_message failed");
            QueueError::from(classify_sdk_error(&err_str))
        })?;

        Ok(QueueAck {
            message_id: output.message_id().map(str::to_owned),
            sequence_number: output.sequence_number().map(str::to_owned),
            md5_of_body: output.md5_of_message_body().map(str::to_owned),
        })
    }
}
