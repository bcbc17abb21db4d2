//! Record/criteria matching.

use tracing::trace;

use crate::dataset::Record;

use super::buckets::RentBuckets;
use super::codes::CodeTable;
use super::criteria::{Criteria, Field, FieldKind, is_wildcard};

/// Decides whether a record satisfies a full set of criteria.
///
/// A record matches only when every field in [`Field::ALL`] is satisfied.
/// Missing criteria, unknown codes and unparseable rents never raise errors;
/// they simply fail to match.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    buckets: RentBuckets,
    codes: CodeTable,
}

impl MatchEngine {
    pub fn new(buckets: RentBuckets, codes: CodeTable) -> Self {
        Self { buckets, codes }
    }

    pub fn buckets(&self) -> &RentBuckets {
        &self.buckets
    }

    pub fn codes(&self) -> &CodeTable {
        &self.codes
    }

    pub fn matches(&self, record: &Record, criteria: &Criteria) -> bool {
        let satisfied = Field::ALL
            .iter()
            .filter(|field| self.field_matches(record, criteria, **field))
            .count();
        satisfied == Field::ALL.len()
    }

    /// Whether a single field is satisfied.
    pub fn field_matches(&self, record: &Record, criteria: &Criteria, field: Field) -> bool {
        let Some(wanted) = criteria.get(field) else {
            trace!(%field, "Criterion missing");
            return false;
        };
        if is_wildcard(wanted) {
            return true;
        }

        match field.kind() {
            FieldKind::Text => text_values(record, field)
                .iter()
                .any(|value| value.contains(wanted)),
            FieldKind::Coded => self
                .codes
                .translate(coded_value(record, field))
                .is_some_and(|label| label == wanted),
            FieldKind::Bucket => self
                .buckets
                .classify(&record.rent)
                .is_some_and(|bucket| bucket.label == wanted),
        }
    }
}

fn text_values(record: &Record, field: Field) -> Vec<&str> {
    match field {
        Field::Area => vec![record.district.as_str(), record.address.as_str()],
        Field::HouseType => vec![record.house_type.as_str()],
        _ => Vec::new(),
    }
}

fn coded_value(record: &Record, field: Field) -> &str {
    match field {
        Field::Internet => record.internet.as_str(),
        Field::Water => record.water.as_str(),
        Field::Electricity => record.electricity.as_str(),
        _ => "",
    }
}
