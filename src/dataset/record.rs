//! Listing records and the dataset normalizer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::DatasetError;

/// A single rental listing.
///
/// Every attribute is kept as a string. Numbers in the source document are
/// stringified and missing attributes become empty strings, so a record never
/// fails to normalize because of its shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub house_type: String,
    /// Monthly rent as written by the source, e.g. `"3500"` or `"3,500元"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub rent: String,
    /// `T`/`F` code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub internet: String,
    /// `T`/`F` code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub water: String,
    /// `T`/`F` code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub electricity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => (if b { "T" } else { "F" }).to_string(),
        other => other.to_string(),
    })
}

/// An ordered, immutable sequence of records from one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Parse a raw response body and extract the record array at `pointer`.
    ///
    /// An empty pointer means the document itself is the array. Elements that
    /// are not JSON objects are skipped.
    pub fn from_slice(body: &[u8], pointer: &str) -> Result<Self, DatasetError> {
        let document: Value = serde_json::from_slice(body)?;
        Self::from_value(document, pointer)
    }

    pub fn from_value(mut document: Value, pointer: &str) -> Result<Self, DatasetError> {
        let collection = document
            .pointer_mut(pointer)
            .map(Value::take)
            .ok_or_else(|| DatasetError::MissingCollection {
                pointer: pointer.to_string(),
            })?;

        let Value::Array(items) = collection else {
            return Err(DatasetError::MissingCollection {
                pointer: pointer.to_string(),
            });
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                debug!(index, "Skipping non-object dataset element");
                continue;
            }
            records.push(serde_json::from_value(item)?);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}
