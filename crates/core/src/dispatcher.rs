use std::num::FpCategory;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::attribute::MessageAttributes;
use crate::blob::BlobClient;
use crate::builder::DispatcherBuilder;
use crate::config::{DispatcherConfig, ValidatedConfig};
use crate::error::{BlobError, ConfigError, DispatchError, InputError};
use crate::metrics::DispatchMetrics;
use crate::pointer::{KeyGenerator, MessagePointer};
use crate::queue::{QueueAck, QueueClient};
use crate::sizing::{MessageSize, serialize_body};

/// Which path a message takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// The body is sent inline.
    Direct,
    /// The body goes to blob storage and a pointer is sent instead.
    Offload,
}

/// The outcome of validating and measuring a message, before anything is
/// sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    pub decision: RouteDecision,
    pub size: MessageSize,
    pub threshold: u64,
    /// `true` when the decision came from `force_offload` rather than size.
    pub forced: bool,
    #[serde(skip)]
    body: String,
}

impl DispatchPlan {
    /// The body in its wire form.
    pub fn serialized_body(&self) -> &str {
        &self.body
    }
}

/// How a sent message travelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// The body was sent inline.
    Direct,
    /// The body was stored at the pointer's location and the pointer was sent.
    Offloaded(MessagePointer),
}

/// Result of a successful [`Dispatcher::send`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    pub route: Route,
    pub size: MessageSize,
    /// The queue's acknowledgment, unchanged.
    pub ack: QueueAck,
}

/// Sends messages to a queue, moving bodies that are too large for the queue
/// into blob storage and sending a [`MessagePointer`] in their place.
///
/// A dispatcher holds only immutable configuration and shared collaborator
/// handles, so it is cheap to clone and safe to use from many tasks at once.
#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) config: Arc<ValidatedConfig>,
    pub(crate) queue: Arc<dyn QueueClient>,
    pub(crate) blob: Arc<dyn BlobClient>,
    pub(crate) keys: Arc<dyn KeyGenerator>,
    pub(crate) metrics: Arc<DispatchMetrics>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("queue", &"<QueueClient>")
            .field("blob", &"<BlobClient>")
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Build a dispatcher from `config` and the two collaborators.
    pub fn new(
        config: DispatcherConfig,
        queue: Arc<dyn QueueClient>,
        blob: Arc<dyn BlobClient>,
    ) -> Result<Self, ConfigError> {
        Self::builder().config(config).queue(queue).blob(blob).build()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Validate and measure a message and decide its route without
    /// contacting any collaborator.
    pub fn plan(
        &self,
        body: &Value,
        attributes: Option<&MessageAttributes>,
    ) -> Result<DispatchPlan, InputError> {
        if is_absent(body) {
            return Err(InputError::MissingBody);
        }

        if let Some(attrs) = attributes
            && attrs.len() > self.config.max_attributes()
        {
            return Err(InputError::TooManyAttributes {
                count: attrs.len(),
                max: self.config.max_attributes(),
            });
        }

        let body = serialize_body(body)?;
        let size = MessageSize::measure(&body, attributes);
        let threshold = self.config.size_threshold();
        let forced = self.config.force_offload();

        let decision = if forced || size.exceeds(threshold) {
            RouteDecision::Offload
        } else {
            RouteDecision::Direct
        };

        Ok(DispatchPlan {
            decision,
            size,
            threshold,
            forced,
            body,
        })
    }

    /// Send a message, offloading the body if it is too large or offload is
    /// forced.
    ///
    /// On the offload path the blob write always completes before the queue
    /// send starts; if the write fails nothing is sent. If the queue send
    /// fails after a successful write, the stored object stays in place and
    /// its location is reported through [`DispatchError::orphaned_object`].
    #[instrument(
        skip(self, body, attributes),
        fields(queue_url = %self.config.queue_url(), route = tracing::field::Empty)
    )]
    pub async fn send(
        &self,
        body: &Value,
        attributes: Option<&MessageAttributes>,
    ) -> Result<DispatchReceipt, DispatchError> {
        let plan = self.plan(body, attributes).inspect_err(|e| {
            self.metrics.increment_input_rejected();
            warn!(error = %e, "message rejected");
        })?;

        debug!(
            body_bytes = plan.size.body,
            attribute_bytes = plan.size.attributes,
            total_bytes = plan.size.total(),
            threshold = plan.threshold,
            forced = plan.forced,
            "measured message"
        );

        let empty = MessageAttributes::new();
        let attributes = attributes.unwrap_or(&empty);

        match plan.decision {
            RouteDecision::Direct => {
                tracing::Span::current().record("route", "direct");
                self.send_direct(&plan, attributes).await
            }
            RouteDecision::Offload => {
                tracing::Span::current().record("route", "offload");
                self.send_offloaded(&plan, attributes).await
            }
        }
    }

    /// Serialize a typed body and [`send`](Self::send) it.
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        body: &T,
        attributes: Option<&MessageAttributes>,
    ) -> Result<DispatchReceipt, DispatchError> {
        let value = serde_json::to_value(body).map_err(|e| {
            self.metrics.increment_input_rejected();
            InputError::Serialization(e.to_string())
        })?;
        self.send(&value, attributes).await
    }

    async fn send_direct(
        &self,
        plan: &DispatchPlan,
        attributes: &MessageAttributes,
    ) -> Result<DispatchReceipt, DispatchError> {
        let ack = self
            .queue
            .send(self.config.queue_url(), plan.serialized_body(), attributes)
            .await
            .map_err(|source| {
                error!(error = %source, "queue send failed");
                self.metrics.increment_send_failed();
                DispatchError::Send {
                    pointer: None,
                    source,
                }
            })?;

        self.metrics.increment_direct();
        info!(
            message_id = ack.message_id.as_deref().unwrap_or("unknown"),
            total_bytes = plan.size.total(),
            "message sent"
        );

        Ok(DispatchReceipt {
            route: Route::Direct,
            size: plan.size,
            ack,
        })
    }

    async fn send_offloaded(
        &self,
        plan: &DispatchPlan,
        attributes: &MessageAttributes,
    ) -> Result<DispatchReceipt, DispatchError> {
        let key = self.keys.next_key();

        let Some(bucket) = self.config.bucket() else {
            error!(key = %key, "message requires offload but no bucket is configured");
            self.metrics.increment_offload_failed();
            return Err(DispatchError::Offload {
                key,
                source: BlobError::Configuration("no bucket configured for offload".to_owned()),
            });
        };

        debug!(bucket = %bucket, key = %key, "writing payload to blob storage");

        if let Err(source) = self.blob.put(bucket, &key, plan.serialized_body()).await {
            error!(error = %source, bucket = %bucket, key = %key, "blob write failed");
            self.metrics.increment_offload_failed();
            return Err(DispatchError::Offload { key, source });
        }

        let pointer = MessagePointer::new(bucket, key);

        let ack = match self
            .queue
            .send(self.config.queue_url(), &pointer.to_payload(), attributes)
            .await
        {
            Ok(ack) => ack,
            Err(source) => {
                warn!(
                    error = %source,
                    bucket = %pointer.bucket,
                    key = %pointer.key,
                    "queue send failed after payload was stored; object left in place"
                );
                self.metrics.increment_send_failed();
                return Err(DispatchError::Send {
                    pointer: Some(pointer),
                    source,
                });
            }
        };

        self.metrics.increment_offloaded();
        info!(
            message_id = ack.message_id.as_deref().unwrap_or("unknown"),
            bucket = %pointer.bucket,
            key = %pointer.key,
            total_bytes = plan.size.total(),
            "message sent via offload"
        );

        Ok(DispatchReceipt {
            route: Route::Offloaded(pointer),
            size: plan.size,
            ack,
        })
    }
}

/// A body counts as absent when it is `null`, `false`, zero or an empty
/// string. Empty objects and arrays are real bodies.
fn is_absent(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|v| v.classify() == FpCategory::Zero),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
