use std::collections::BTreeMap;
use std::collections::btree_map;

use bytes::Bytes;
use serde::Serialize;

use crate::sizing::byte_len;

/// Data type tag for plain text attributes.
pub const STRING_DATA_TYPE: &str = "String";
/// Data type tag for numeric attributes (carried as text).
pub const NUMBER_DATA_TYPE: &str = "Number";
/// Data type tag for binary attributes.
pub const BINARY_DATA_TYPE: &str = "Binary";

/// A binary payload with an explicitly declared size.
///
/// The declared size is what counts towards the message size, regardless of
/// how many bytes `data` currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizedBlob {
    declared_size: u64,
    data: Bytes,
}

impl SizedBlob {
    /// Wrap `data`, declaring its actual length as the size.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            declared_size: data.len() as u64,
            data,
        }
    }

    /// Wrap `data` with an explicitly declared size.
    pub fn with_declared_size(data: impl Into<Bytes>, declared_size: u64) -> Self {
        Self {
            declared_size,
            data: data.into(),
        }
    }

    /// The size this blob reports.
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// The blob content.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// The binary value of a message attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryValue {
    /// A raw byte buffer.
    Raw(Bytes),
    /// Binary data held as text; sized by its UTF-8 encoding.
    Text(String),
    /// A blob-like object sized by its declared size.
    Sized(SizedBlob),
}

impl BinaryValue {
    /// Number of bytes this value contributes to the message size.
    pub fn encoded_len(&self) -> u64 {
        match self {
            Self::Raw(bytes) => bytes.len() as u64,
            Self::Text(text) => byte_len(text),
            Self::Sized(blob) => blob.declared_size(),
        }
    }

    /// The bytes sent on the wire.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Raw(bytes) => bytes.clone(),
            Self::Text(text) => Bytes::from(text.clone().into_bytes()),
            Self::Sized(blob) => blob.data().clone(),
        }
    }
}

impl From<Bytes> for BinaryValue {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes)
    }
}

impl From<Vec<u8>> for BinaryValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for BinaryValue {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Raw(Bytes::from_static(bytes))
    }
}

impl From<String> for BinaryValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<SizedBlob> for BinaryValue {
    fn from(blob: SizedBlob) -> Self {
        Self::Sized(blob)
    }
}

/// A single named piece of message metadata.
///
/// Attributes travel with the message on both the direct and the offload
/// path; they are never written to blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageAttribute {
    /// Data type tag (`String`, `Number`, `Binary`, optionally with a
    /// custom suffix such as `String.json`).
    pub data_type: String,
    /// Text value, for `String` and `Number` attributes.
    pub string_value: Option<String>,
    /// Binary value, for `Binary` attributes.
    pub binary_value: Option<BinaryValue>,
}

impl MessageAttribute {
    /// A `String` attribute.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: STRING_DATA_TYPE.to_owned(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    /// A `Number` attribute. The value is carried as text.
    pub fn number(value: impl ToString) -> Self {
        Self {
            data_type: NUMBER_DATA_TYPE.to_owned(),
            string_value: Some(value.to_string()),
            binary_value: None,
        }
    }

    /// A `Binary` attribute.
    pub fn binary(value: impl Into<BinaryValue>) -> Self {
        Self {
            data_type: BINARY_DATA_TYPE.to_owned(),
            string_value: None,
            binary_value: Some(value.into()),
        }
    }

    /// Override the data type tag.
    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    /// Bytes this attribute contributes to the message size when stored
    /// under `name`: name, data type, text value and binary value.
    ///
    /// Saturates at `u64::MAX` instead of wrapping.
    pub fn encoded_size(&self, name: &str) -> u64 {
        byte_len(name)
            .saturating_add(byte_len(&self.data_type))
            .saturating_add(self.string_value.as_deref().map_or(0, byte_len))
            .saturating_add(self.binary_value.as_ref().map_or(0, BinaryValue::encoded_len))
    }
}

/// Message attributes keyed by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageAttributes(BTreeMap<String, MessageAttribute>);

impl MessageAttributes {
    /// An empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        attribute: MessageAttribute,
    ) -> Option<MessageAttribute> {
        self.0.insert(name.into(), attribute)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, attribute: MessageAttribute) -> Self {
        self.insert(name, attribute);
        self
    }

    /// The attribute stored under `name`.
    pub fn get(&self, name: &str) -> Option<&MessageAttribute> {
        self.0.get(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate attributes in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, MessageAttribute> {
        self.0.iter()
    }

    /// Sum of [`MessageAttribute::encoded_size`] over every entry,
    /// saturating at `u64::MAX`.
    pub fn encoded_size(&self) -> u64 {
        self.0
            .iter()
            .map(|(name, attribute)| attribute.encoded_size(name))
            .fold(0, u64::saturating_add)
    }
}

impl<K: Into<String>> FromIterator<(K, MessageAttribute)> for MessageAttributes {
    fn from_iter<I: IntoIterator<Item = (K, MessageAttribute)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, attribute)| (name.into(), attribute))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a MessageAttributes {
    type Item = (&'a String, &'a MessageAttribute);
    type IntoIter = btree_map::Iter<'a, String, MessageAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
