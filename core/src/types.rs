//! Domain types for the movie collection.
//!
//! # Design
//! The server is loosely typed: ids arrive as numbers or strings, ratings as
//! numbers or numeric strings, optional text as `null` or `""`. All of that is
//! normalized here, once, during deserialization, so nothing downstream ever
//! sees an untyped value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::ValidationError;

/// Server-assigned identity of an item. Opaque: only compared and echoed
/// back in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(ItemId(n.to_string())),
            RawId::Text(s) => Ok(ItemId(s)),
        }
    }
}

/// A rating in `[Rating::MIN, Rating::MAX]`. "Unrated" is `Option::None`,
/// never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Normalize a loosely-typed wire value. `Ok(None)` means unrated;
    /// `Err` carries the offending text for logging.
    fn from_wire(value: &serde_json::Value) -> Result<Option<Self>, String> {
        let number = match value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) if s.trim().is_empty() => return Ok(None),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            other => return Err(other.to_string()),
        };
        match number {
            Some(n) if n.fract() == 0.0 => Rating::new(n as i64)
                .map(Some)
                .map_err(|_| value.to_string()),
            _ => Err(value.to_string()),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

fn deserialize_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Rating>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    match Rating::from_wire(&raw) {
        Ok(rating) => Ok(rating),
        Err(raw) => {
            warn!(rating = %raw, "discarding rating outside 1..=5 from server");
            Ok(None)
        }
    }
}

fn deserialize_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// A single movie as served by the collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// Empty when the server sent none; an empty name never matches a search.
    #[serde(default, deserialize_with = "deserialize_name")]
    pub name: String,
    /// Shown as the genre label.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: Option<Rating>,
    /// Resolved by the server; the client cannot derive it.
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub image_url: Option<String>,
}

impl Item {
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// An image chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Validated payload of a create or update. Only produced by
/// `ItemForm::validate`, so `name` is never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub rating: Option<Rating>,
}
