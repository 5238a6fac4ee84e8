//! Byte accounting used to decide whether a message must be offloaded.
//!
//! The total size of a message is the UTF-8 length of its serialized body
//! plus, for every attribute, the length of its name, data type, text value
//! and binary value. This mirrors how the queue service measures messages
//! against its own size limit.

use serde::Serialize;
use serde_json::Value;

use crate::attribute::MessageAttributes;
use crate::error::InputError;

/// Size above which a message is offloaded when no threshold is configured
/// (256 KiB, the queue service's per-message limit).
pub const DEFAULT_SIZE_THRESHOLD: u64 = 262_144;

/// Maximum number of attributes a message may carry unless configured
/// otherwise.
pub const MAX_ATTRIBUTES: usize = 10;

/// Size breakdown of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageSize {
    /// Bytes in the serialized body.
    pub body: u64,
    /// Bytes across all attributes.
    pub attributes: u64,
}

impl MessageSize {
    /// Measure a serialized body together with its attributes.
    pub fn measure(serialized_body: &str, attributes: Option<&MessageAttributes>) -> Self {
        Self {
            body: byte_len(serialized_body),
            attributes: attributes.map_or(0, MessageAttributes::encoded_size),
        }
    }

    /// Body plus attributes, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.body.saturating_add(self.attributes)
    }

    /// `true` when the total is strictly greater than `threshold`.
    pub fn exceeds(&self, threshold: u64) -> bool {
        self.total() > threshold
    }
}

/// Serialize a body to its wire form (compact JSON).
pub fn serialize_body(body: &Value) -> Result<String, InputError> {
    serde_json::to_string(body).map_err(|e| InputError::Serialization(e.to_string()))
}

/// UTF-8 encoded length of `text` in bytes.
pub fn byte_len(text: &str) -> u64 {
    text.len() as u64
}
