//! Queue message dispatch with transparent blob-storage offload.
//!
//! A [`Dispatcher`] measures each outgoing message (serialized body plus
//! attributes). Messages at or under the configured threshold are sent to the
//! queue as-is. Larger messages, or every message when `force_offload` is
//! set, have their body written to blob storage under a fresh key and a small
//! [`MessagePointer`] is sent through the queue instead.
//!
//! The queue and the blob store are reached through the [`QueueClient`] and
//! [`BlobClient`] traits; `spill-aws` provides SQS and S3 implementations and
//! [`memory`] provides in-memory ones for tests.

pub mod attribute;
pub mod blob;
pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod pointer;
pub mod queue;
pub mod sizing;

pub use attribute::{BinaryValue, MessageAttribute, MessageAttributes, SizedBlob};
pub use blob::BlobClient;
pub use builder::DispatcherBuilder;
pub use config::{DispatcherConfig, ValidatedConfig};
pub use dispatcher::{DispatchPlan, DispatchReceipt, Dispatcher, Route, RouteDecision};
pub use error::{BlobError, ConfigError, DispatchError, InputError, QueueError};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pointer::{KeyGenerator, MessagePointer, UuidKeyGenerator};
pub use queue::{QueueAck, QueueClient};
pub use sizing::{DEFAULT_SIZE_THRESHOLD, MAX_ATTRIBUTES, MessageSize};
