use async_trait::async_trait;

use crate::error::BlobError;

/// Writes offloaded payloads to object storage.
///
/// Implementations must be safe to call concurrently. A successful return
/// means the object is durably stored and readable under `(container, key)`.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// Store `payload` under `key` in `container`.
    async fn put(&self, container: &str, key: &str, payload: &str) -> Result<(), BlobError>;
}
