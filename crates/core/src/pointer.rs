use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The record sent through the queue in place of an offloaded body.
///
/// Serialized as `{"bucket":"...","key":"..."}` with no other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessagePointer {
    /// Bucket holding the payload.
    pub bucket: String,
    /// Object key of the payload.
    pub key: String,
}

impl MessagePointer {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The queue payload for this pointer.
    pub fn to_payload(&self) -> String {
        serde_json::json!({ "bucket": self.bucket, "key": self.key }).to_string()
    }
}

/// Source of object keys for offloaded payloads.
///
/// Every call must return a key that has never been returned before.
pub trait KeyGenerator: Send + Sync {
    fn next_key(&self) -> String;
}

/// Generates UUID v7 keys (millisecond timestamp plus random bits),
/// optionally behind a fixed prefix.
#[derive(Debug, Clone, Default)]
pub struct UuidKeyGenerator {
    prefix: Option<String>,
}

impl UuidKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` verbatim to every key (e.g. `"payloads/"`).
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

impl KeyGenerator for UuidKeyGenerator {
    fn next_key(&self) -> String {
        let id = Uuid::now_v7();
        match &self.prefix {
            Some(prefix) => format!("{prefix}{id}"),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn pointer_serializes_to_two_fields() {
        let pointer = MessagePointer::new("my-bucket", "abc");
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(json, r#"{"bucket":"my-bucket","key":"abc"}"#);
    }

    #[test]
    fn payload_round_trips_through_serde() {
        let pointer = MessagePointer::new("my-bucket", "payloads/abc");
        let payload = pointer.to_payload();
        assert_eq!(payload, r#"{"bucket":"my-bucket","key":"payloads/abc"}"#);
        let parsed: MessagePointer = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed, pointer);
    }

    #[test]
    fn pointer_rejects_extra_fields() {
        let result: Result<MessagePointer, _> =
            serde_json::from_str(r#"{"bucket":"b","key":"k","size":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn uuid_keys_are_unique() {
        let generator = UuidKeyGenerator::new();
        let keys: HashSet<String> = (0..1000).map(|_| generator.next_key()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn uuid_keys_parse_as_v7() {
        let key = UuidKeyGenerator::new().next_key();
        let id = Uuid::parse_str(&key).unwrap();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn prefix_is_prepended() {
        let key = UuidKeyGenerator::new().with_prefix("payloads/").next_key();
        let rest = key.strip_prefix("payloads/").unwrap();
        assert!(Uuid::parse_str(rest).is_ok());
    }
}
