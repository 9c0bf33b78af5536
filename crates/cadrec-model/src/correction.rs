//! Correction ledger row types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One append-only audit row. Entries are never edited or deleted; the run's
/// ledger is the sequence of entries in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub timestamp: DateTime<Utc>,
    pub case_key: String,
    pub field: String,
    /// `None` when the field was absent before the correction.
    pub old_value: Option<String>,
    pub new_value: String,
    pub correction_type: String,
}

/// A named set of corrections keyed by case, applied as one unit. Sets are
/// applied in declared order; later sets override earlier ones when both
/// touch the same field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionSet {
    pub name: String,
    /// Recorded on every entry this set produces (e.g. "address_fix").
    pub correction_type: String,
    /// case key -> field -> new value.
    pub entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl CorrectionSet {
    pub fn new(name: impl Into<String>, correction_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            correction_type: correction_type.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        case_key: impl Into<String>,
        field: impl Into<String>,
        new_value: impl Into<String>,
    ) {
        self.entries
            .entry(case_key.into())
            .or_default()
            .insert(field.into(), new_value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
