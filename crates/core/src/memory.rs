//! In-memory collaborators for tests.
//!
//! Both doubles record every call they receive and can be switched into a
//! failing mode, which makes it possible to assert which collaborators a
//! dispatch touched and in what order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::attribute::MessageAttributes;
use crate::blob::BlobClient;
use crate::error::{BlobError, QueueError};
use crate::queue::{QueueAck, QueueClient};

/// A message accepted by [`MemoryQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub endpoint: String,
    pub payload: String,
    pub attributes: MessageAttributes,
}

/// A queue that keeps every sent message in memory.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    sent: Mutex<Vec<SentMessage>>,
    attempts: AtomicU64,
    failure: Mutex<Option<QueueError>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose every send fails with `error`.
    pub fn failing(error: QueueError) -> Self {
        let queue = Self::new();
        queue.set_failure(Some(error));
        queue
    }

    /// Make subsequent sends fail with `error`, or succeed again with `None`.
    pub fn set_failure(&self, error: Option<QueueError>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of send calls, including failed ones.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueClient for MemoryQueue {
    async fn send(
        &self,
        endpoint: &str,
        payload: &str,
        attributes: &MessageAttributes,
    ) -> Result<QueueAck, QueueError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(error) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                endpoint: endpoint.to_owned(),
                payload: payload.to_owned(),
                attributes: attributes.clone(),
            });

        Ok(QueueAck {
            message_id: Some(format!("msg-{attempt}")),
            sequence_number: None,
            md5_of_body: None,
        })
    }
}

/// An object written to [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub container: String,
    pub key: String,
    pub payload: String,
}

/// A blob store that keeps every written object in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<Vec<StoredObject>>,
    attempts: AtomicU64,
    failure: Mutex<Option<BlobError>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails with `error`.
    pub fn failing(error: BlobError) -> Self {
        let store = Self::new();
        store.set_failure(Some(error));
        store
    }

    /// Make subsequent writes fail with `error`, or succeed again with `None`.
    pub fn set_failure(&self, error: Option<BlobError>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Objects written so far, in write order.
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up a stored object's payload.
    pub fn get(&self, container: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|o| o.container == container && o.key == key)
            .map(|o| o.payload.clone())
    }

    /// Number of put calls, including failed ones.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobClient for MemoryBlobStore {
    async fn put(&self, container: &str, key: &str, payload: &str) -> Result<(), BlobError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }

        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StoredObject {
                container: container.to_owned(),
                key: key.to_owned(),
                payload: payload.to_owned(),
            });
        Ok(())
    }
}
