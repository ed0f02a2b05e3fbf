//! Drop matrix: per-stage access to drop records
//!
//! A `DropMatrix` holds the records from one matrix query in the order the
//! service returned them. Lookups by stage id start out as a linear scan;
//! after [`DropMatrix::build_index`] they go through a [`GroupIndex`]
//! instead. Both paths return the same records in the same order.
//!
//! ```rust
//! use penguin_stats::DropMatrix;
//!
//! let json = r#"[
//!     {"stageId": "main_01-07", "itemId": "30012", "quantity": 3, "times": 2, "start": 0},
//!     {"stageId": "main_04-04", "itemId": "30013", "quantity": 1, "times": 5, "start": 0}
//! ]"#;
//! let mut matrix: DropMatrix = serde_json::from_str(json).unwrap();
//!
//! assert_eq!(matrix.lookup("main_01-07").len(), 1);
//! matrix.build_index();
//! assert_eq!(matrix.lookup("main_01-07").len(), 1);
//! assert!(matrix.lookup("unknown").is_empty());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::DropRecord;

/// Stage id -> positions of that stage's records, in matrix order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndex {
    groups: HashMap<String, Vec<usize>>,
    /// Stage ids in first-seen order
    order: Vec<String>,
}

impl GroupIndex {
    /// Partition `records` by stage id in a single pass
    fn build(records: &[DropRecord]) -> Self {
        let mut index = GroupIndex::default();

        for (pos, record) in records.iter().enumerate() {
            if let Some(positions) = index.groups.get_mut(&record.stage_id) {
                positions.push(pos);
            } else {
                index.order.push(record.stage_id.clone());
                index.groups.insert(record.stage_id.clone(), vec![pos]);
            }
        }

        index
    }

    /// Number of distinct stages
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, stage_id: &str) -> bool {
        self.groups.contains_key(stage_id)
    }

    /// Stage ids in the order they first appear in the matrix
    pub fn stage_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Positions into [`DropMatrix::raw`] for a stage; empty if absent
    pub fn positions(&self, stage_id: &str) -> &[usize] {
        self.groups.get(stage_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Drop records returned by one matrix query
///
/// The records are never mutated. The index is either absent (lookups
/// scan) or built (lookups use it); once built it is kept until the matrix
/// is dropped. Equality compares the records only.
#[derive(Debug, Clone, Default)]
pub struct DropMatrix {
    records: Vec<DropRecord>,
    index: Option<GroupIndex>,
}

impl DropMatrix {
    /// Wrap records in service order; the matrix starts unindexed
    pub fn new(records: Vec<DropRecord>) -> Self {
        Self {
            records,
            index: None,
        }
    }

    /// Build the stage index, or return the one already built
    ///
    /// Runs once per matrix in O(n). Later calls do no work.
    pub fn build_index(&mut self) -> &GroupIndex {
        let records = &self.records;
        self.index.get_or_insert_with(|| GroupIndex::build(records))
    }

    /// Records for `stage_id` in matrix order, empty if there are none
    ///
    /// O(1) to find the group once indexed, a full scan otherwise.
    pub fn lookup(&self, stage_id: &str) -> Vec<&DropRecord> {
        match &self.index {
            Some(index) => index
                .positions(stage_id)
                .iter()
                .filter_map(|&pos| self.records.get(pos))
                .collect(),
            None => self
                .records
                .iter()
                .filter(|record| record.stage_id == stage_id)
                .collect(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// The stage index, if [`build_index`](Self::build_index) has run
    pub fn index(&self) -> Option<&GroupIndex> {
        self.index.as_ref()
    }

    /// All records in the order the service returned them
    pub fn raw(&self) -> &[DropRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DropRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct stage ids in first-seen order
    pub fn stage_ids(&self) -> Vec<&str> {
        if let Some(index) = &self.index {
            return index.stage_ids().collect();
        }

        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.stage_id.as_str())
            .filter(|stage_id| seen.insert(*stage_id))
            .collect()
    }

    /// Every stage with its records, stages in first-seen order
    pub fn groups(&self) -> Vec<(&str, Vec<&DropRecord>)> {
        self.stage_ids()
            .into_iter()
            .map(|stage_id| (stage_id, self.lookup(stage_id)))
            .collect()
    }
}

impl PartialEq for DropMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for DropMatrix {}

impl From<Vec<DropRecord>> for DropMatrix {
    fn from(records: Vec<DropRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<DropRecord> for DropMatrix {
    fn from_iter<I: IntoIterator<Item = DropRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Serialize for DropMatrix {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DropMatrix {
    /// Accepts either a bare array of records or the service's
    /// `{"matrix": [...]}` envelope.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Body {
            Bare(Vec<DropRecord>),
            Wrapped { matrix: Vec<DropRecord> },
        }

        let records = match Body::deserialize(deserializer)? {
            Body::Bare(records) => records,
            Body::Wrapped { matrix } => matrix,
        };

        Ok(Self::new(records))
    }
}
