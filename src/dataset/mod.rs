//! Listing dataset: normalization and retrieval.

pub mod record;
pub mod source;

pub use record::{Dataset, Record};
pub use source::{DatasetSource, HttpDatasetSource};
