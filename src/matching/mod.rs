//! Matching listings against the answers a user gave.

pub mod buckets;
pub mod codes;
pub mod criteria;
pub mod engine;

pub use buckets::{RentBucket, RentBuckets};
pub use codes::CodeTable;
pub use criteria::{Criteria, Field, FieldKind, WILDCARD};
pub use engine::MatchEngine;
