//! Incremental result scanning.

use std::sync::Arc;

use crate::dataset::{Dataset, Record};
use crate::matching::{Criteria, MatchEngine};

/// A session's position in the dataset it fetched.
///
/// The dataset is captured per search, so another user's fetch never changes
/// what this cursor sees. `offset` only moves forward and never exceeds the
/// dataset length.
#[derive(Debug, Clone)]
pub struct SearchCursor {
    dataset: Arc<Dataset>,
    offset: usize,
}

impl SearchCursor {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset, offset: 0 }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Index the next scan starts from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the first matching record at or after the offset and move the
    /// offset just past it. On exhaustion the offset rests at the end.
    pub fn next_match(
        &mut self,
        engine: &MatchEngine,
        criteria: &Criteria,
    ) -> Option<(usize, &Record)> {
        let records = self.dataset.records();
        let start = self.offset.min(records.len());

        match records[start..]
            .iter()
            .position(|record| engine.matches(record, criteria))
        {
            Some(relative) => {
                let index = start + relative;
                self.offset = index + 1;
                Some((index, &records[index]))
            }
            None => {
                self.offset = records.len();
                None
            }
        }
    }
}
