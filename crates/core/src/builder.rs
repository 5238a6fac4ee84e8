use std::sync::Arc;

use crate::blob::BlobClient;
use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ConfigError;
use crate::metrics::DispatchMetrics;
use crate::pointer::{KeyGenerator, UuidKeyGenerator};
use crate::queue::QueueClient;

/// Fluent builder for constructing a [`Dispatcher`].
///
/// A config, a [`QueueClient`] and a [`BlobClient`] must be supplied. The
/// key generator defaults to [`UuidKeyGenerator`] using the configured key
/// prefix.
#[derive(Default)]
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    queue: Option<Arc<dyn QueueClient>>,
    blob: Option<Arc<dyn BlobClient>>,
    key_generator: Option<Arc<dyn KeyGenerator>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatcher configuration.
    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the queue client.
    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn QueueClient>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Set the blob client.
    #[must_use]
    pub fn blob(mut self, blob: Arc<dyn BlobClient>) -> Self {
        self.blob = Some(blob);
        self
    }

    /// Replace the default object key generator.
    #[must_use]
    pub fn key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.key_generator = Some(key_generator);
        self
    }

    /// Validate the configuration and build the dispatcher.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let config = self.config.validate()?;

        let queue = self
            .queue
            .ok_or(ConfigError::MissingCollaborator("queue client"))?;
        let blob = self
            .blob
            .ok_or(ConfigError::MissingCollaborator("blob client"))?;

        let keys = self.key_generator.unwrap_or_else(|| {
            let generator = match config.key_prefix() {
                Some(prefix) => UuidKeyGenerator::new().with_prefix(prefix),
                None => UuidKeyGenerator::new(),
            };
            Arc::new(generator)
        });

        Ok(Dispatcher {
            config: Arc::new(config),
            queue,
            blob,
            keys,
            metrics: Arc::new(DispatchMetrics::default()),
        })
    }
}
