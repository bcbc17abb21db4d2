//! Search criteria collected from the questionnaire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer meaning "no constraint on this field".
pub const WILDCARD: &str = "都可";

/// How a field is compared against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Case-sensitive substring search.
    Text,
    /// Numeric value placed into a named rent bucket.
    Bucket,
    /// Single-letter code translated to a label.
    Coded,
}

/// A searchable listing attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Area,
    Rent,
    HouseType,
    Internet,
    Water,
    Electricity,
}

impl Field {
    /// Every field a record must satisfy, in questionnaire order.
    pub const ALL: [Field; 6] = [
        Field::Area,
        Field::Rent,
        Field::HouseType,
        Field::Internet,
        Field::Water,
        Field::Electricity,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Area | Self::HouseType => FieldKind::Text,
            Self::Rent => FieldKind::Bucket,
            Self::Internet | Self::Water | Self::Electricity => FieldKind::Coded,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Area => "area",
            Self::Rent => "rent",
            Self::HouseType => "house_type",
            Self::Internet => "internet",
            Self::Water => "water",
            Self::Electricity => "electricity",
        };
        write!(f, "{s}")
    }
}

/// Answers collected so far, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    values: BTreeMap<Field, String>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria with every field set to the wildcard.
    pub fn any() -> Self {
        Field::ALL.iter().fold(Self::new(), |c, f| c.with(*f, WILDCARD))
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Store an answer verbatim, replacing any earlier one.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether every field has an answer.
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| self.values.contains_key(f))
    }
}

/// Whether an answer is the wildcard. Surrounding whitespace is ignored.
pub fn is_wildcard(value: &str) -> bool {
    value.trim() == WILDCARD
}
