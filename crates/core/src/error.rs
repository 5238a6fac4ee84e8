use thiserror::Error;

use crate::pointer::MessagePointer;

/// Errors raised while building a [`Dispatcher`](crate::Dispatcher).
///
/// These are only ever returned at construction time; a dispatcher that was
/// built successfully never reports a configuration problem from `send`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No queue URL was configured.
    #[error("queue url is required")]
    MissingQueueUrl,

    /// A bucket was supplied but is not a usable name.
    #[error("invalid bucket name: {0:?}")]
    InvalidBucket(String),

    /// Every message is offloaded but no bucket was configured.
    #[error("a bucket is required when force_offload is enabled")]
    MissingBucket,

    /// The size threshold is not a positive byte count.
    #[error("size threshold must be a positive byte count, got {0}")]
    InvalidSizeThreshold(i64),

    /// The attribute limit is zero.
    #[error("max attributes must be at least 1")]
    InvalidMaxAttributes,

    /// A collaborator (queue or blob client) was not supplied to the builder.
    #[error("{0} is required")]
    MissingCollaborator(&'static str),

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {message}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
}

/// Invalid per-call arguments. Raised before any collaborator is contacted.
#[derive(Debug, Error)]
pub enum InputError {
    /// The message body was absent (`null`, `false`, zero or an empty string).
    #[error("message body is required")]
    MissingBody,

    /// More attributes than the configured limit were supplied.
    #[error("too many message attributes: {count} exceeds limit of {max}")]
    TooManyAttributes {
        /// Number of attributes supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The body could not be serialized to its wire form.
    #[error("failed to serialize message body: {0}")]
    Serialization(String),
}

/// Errors reported by a [`QueueClient`](crate::QueueClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue service returned an error.
    #[error("queue service error: {0}")]
    Service(String),

    /// The request was throttled by the queue service.
    #[error("queue request throttled")]
    Throttled,

    /// A network or connection error occurred.
    #[error("queue connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("queue request timed out")]
    Timeout,

    /// The request was rejected before it reached the service.
    #[error("queue request rejected: {0}")]
    Rejected(String),
}

impl QueueError {
    /// Returns `true` if the error is transient and the send may succeed on
    /// retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Connection(_) | Self::Timeout)
    }
}

/// Errors reported by a [`BlobClient`](crate::BlobClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// The storage service returned an error.
    #[error("blob storage error: {0}")]
    Service(String),

    /// The request was throttled by the storage service.
    #[error("blob request throttled")]
    Throttled,

    /// A network or connection error occurred.
    #[error("blob connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("blob request timed out")]
    Timeout,

    /// The write could not be attempted with the current configuration.
    #[error("invalid blob configuration: {0}")]
    Configuration(String),
}

impl BlobError {
    /// Returns `true` if the error is transient and the write may succeed on
    /// retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Connection(_) | Self::Timeout)
    }
}

/// Errors returned by [`Dispatcher::send`](crate::Dispatcher::send).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The call was rejected before any collaborator was contacted.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// The blob write failed. No queue send was attempted.
    #[error("failed to offload payload under key {key}: {source}")]
    Offload {
        /// Object key the payload was to be written under.
        key: String,
        /// Underlying storage error.
        source: BlobError,
    },

    /// The queue send failed.
    ///
    /// When `pointer` is set the payload was already written to blob storage
    /// and the object is left in place; removing it is up to the caller.
    #[error("failed to send message: {source}")]
    Send {
        /// Location of the already-written payload, if the offload path was taken.
        pointer: Option<MessagePointer>,
        /// Underlying queue error.
        source: QueueError,
    },
}

impl DispatchError {
    /// Returns `true` if the wrapped collaborator error is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Input(_) => false,
            Self::Offload { source, .. } => source.is_retryable(),
            Self::Send { source, .. } => source.is_retryable(),
        }
    }

    /// The blob written before a failed queue send, if any.
    pub fn orphaned_object(&self) -> Option<&MessagePointer> {
        match self {
            Self::Send { pointer, .. } => pointer.as_ref(),
            _ => None,
        }
    }
}
