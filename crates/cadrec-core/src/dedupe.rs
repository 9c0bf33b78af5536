//! Duplicate and merge-artifact detection.
//!
//! Detection only flags; nothing is ever removed here. Flagged indices feed
//! the manual-review export.
//!
//! Two distinct signals:
//! - an exact duplicate: identical case key and identical field map as an
//!   earlier record (first occurrence is kept unflagged);
//! - a merge artifact: damage left by an earlier faulty join, either a
//!   doubled joined field value (`X; X`) or a repeated case key whose rows
//!   agree on incident and call time but diverge elsewhere. A legitimate
//!   repeated CAD entry for the same case differs in call time and is not
//!   flagged.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use cadrec_model::CanonicalRecord;

#[derive(Debug, Default, Clone)]
pub struct DuplicateFlags {
    /// Indices of later occurrences of exact-duplicate rows.
    pub exact_duplicates: Vec<usize>,
    /// Indices of rows showing merge-artifact patterns.
    pub merge_artifacts: Vec<usize>,
}

impl DuplicateFlags {
    pub fn flagged_count(&self) -> usize {
        self.exact_duplicates.len() + self.merge_artifacts.len()
    }
}

const INCIDENT_FIELD: &str = "Incident";
const CALL_TIME_FIELD: &str = "CallDateTime";

/// Scan the canonical set and flag duplicates and artifacts.
pub fn detect(records: &[CanonicalRecord]) -> DuplicateFlags {
    let mut flags = DuplicateFlags::default();

    // Pass 1: exact duplicates via a composite key of case key plus the full
    // field map; first occurrence stays unflagged.
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (position, record) in records.iter().enumerate() {
        let composite = composite_key(record);
        if !seen.insert(composite) {
            flags.exact_duplicates.push(position);
        }
    }

    // Pass 2: doubled joined values.
    let mut artifacts: BTreeSet<usize> = BTreeSet::new();
    for (position, record) in records.iter().enumerate() {
        if record
            .fields
            .values()
            .any(|value| is_doubled_value(value))
        {
            artifacts.insert(position);
        }
    }

    // Pass 3: repeated case keys agreeing on incident and call time but
    // diverging elsewhere.
    let mut by_key: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (position, record) in records.iter().enumerate() {
        if record.valid_case_key {
            by_key.entry(record.case_key.as_str()).or_default().push(position);
        }
    }
    let exact: BTreeSet<usize> = flags.exact_duplicates.iter().copied().collect();
    for positions in by_key.values().filter(|positions| positions.len() > 1) {
        let first = &records[positions[0]];
        for &position in &positions[1..] {
            if exact.contains(&position) {
                continue;
            }
            let candidate = &records[position];
            let same_incident = first.get(INCIDENT_FIELD) == candidate.get(INCIDENT_FIELD);
            let same_call_time = first.get(CALL_TIME_FIELD) == candidate.get(CALL_TIME_FIELD);
            if same_incident && same_call_time && first.fields != candidate.fields {
                artifacts.insert(position);
            }
        }
    }

    flags.merge_artifacts = artifacts.into_iter().collect();
    info!(
        exact = flags.exact_duplicates.len(),
        artifacts = flags.merge_artifacts.len(),
        "duplicate detection complete"
    );
    flags
}

fn composite_key(record: &CanonicalRecord) -> String {
    let mut key = record.case_key.clone();
    for (name, value) in &record.fields {
        key.push('|');
        key.push_str(name);
        key.push('=');
        key.push_str(value.trim());
    }
    key
}

/// `X; X` or `X / X` with identical halves.
fn is_doubled_value(value: &str) -> bool {
    for separator in ["; ", " / "] {
        if let Some((left, right)) = value.split_once(separator) {
            let left = left.trim();
            if !left.is_empty() && left == right.trim() {
                return true;
            }
        }
    }
    false
}
