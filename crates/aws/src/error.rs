use spill_core::{BlobError, QueueError};

/// Coarse classification of a failed AWS SDK call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkFailure {
    /// The service throttled the request.
    Throttled,
    /// The request timed out.
    Timeout,
    /// The service could not be reached.
    Connection(String),
    /// The service answered with an error.
    Service(String),
}

/// Classify an AWS SDK error message.
///
/// Looks for throttling, timeout and connection markers in the rendered
/// error; anything else is treated as a service error.
pub fn classify_sdk_error(error_str: &str) -> SdkFailure {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl")
        || lower.contains("rate exceed")
        || lower.contains("too many")
        || lower.contains("slowdown")
    {
        SdkFailure::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        SdkFailure::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
        || lower.contains("dispatch failure")
    {
        SdkFailure::Connection(error_str.to_owned())
    } else {
        SdkFailure::Service(error_str.to_owned())
    }
}

impl From<SdkFailure> for QueueError {
    fn from(failure: SdkFailure) -> Self {
        match failure {
            SdkFailure::Throttled => QueueError::Throttled,
            SdkFailure::Timeout => QueueError::Timeout,
            SdkFailure::Connection(msg) => QueueError::Connection(msg),
            SdkFailure::Service(msg) => QueueError::Service(msg),
        }
    }
}

impl From<SdkFailure> for BlobError {
    fn from(failure: SdkFailure) -> Self {
        match failure {
            SdkFailure::Throttled => BlobError::Throttled,
            SdkFailure::Timeout => BlobError::Timeout,
            SdkFailure::Connection(msg) => BlobError::Connection(msg),
            SdkFailure::Service(msg) => BlobError::Service(msg),
        }
    }
}
