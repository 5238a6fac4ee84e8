use async_trait::async_trait;
use serde::Serialize;

use crate::attribute::MessageAttributes;
use crate::error::QueueError;

/// Acknowledgment returned by the queue for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueAck {
    /// Identifier assigned to the message by the queue.
    pub message_id: Option<String>,
    /// Sequence number, for ordered (FIFO) queues.
    pub sequence_number: Option<String>,
    /// MD5 digest of the message body as computed by the queue.
    pub md5_of_body: Option<String>,
}

/// Sends message payloads to a queue.
///
/// Implementations must be safe to call concurrently; a single
/// [`Dispatcher`](crate::Dispatcher) shares one client across all callers.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Send `payload` with `attributes` to the queue at `endpoint`.
    async fn send(
        &self,
        endpoint: &str,
        payload: &str,
        attributes: &MessageAttributes,
    ) -> Result<QueueAck, QueueError>;
}
