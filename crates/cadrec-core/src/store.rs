//! Indexed canonical record collection.
//!
//! Correction application is keyed by case number; the index makes each
//! lookup a map probe instead of a scan, which is what keeps a 700K-row run
//! single-pass. Several records may legitimately share a case key (repeated
//! CAD entries), so the index maps to an index set.

use std::collections::BTreeMap;

use cadrec_model::CanonicalRecord;

#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<CanonicalRecord>,
    index: BTreeMap<String, Vec<usize>>,
}

impl RecordStore {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (position, record) in records.iter().enumerate() {
            if record.valid_case_key {
                index.entry(record.case_key.clone()).or_default().push(position);
            }
        }
        Self { records, index }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn indices_for(&self, case_key: &str) -> &[usize] {
        self.index.get(case_key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn record_mut(&mut self, position: usize) -> &mut CanonicalRecord {
        &mut self.records[position]
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }
}
