//! Append-only correction ledger.
//!
//! Every field mutation on a canonical record flows through [`CorrectionLedger::apply`]
//! or [`CorrectionLedger::apply_rule`], each producing one audit entry per
//! actual change. Re-applying a correction whose value already matches is a
//! no-op and grows the ledger by nothing, so a whole run can be re-executed
//! on the same inputs without duplicating history.

use chrono::Utc;
use regex::Regex;
use tracing::{info, warn};

use cadrec_config::CorrectionRule;
use cadrec_map::AddressClassifier;
use cadrec_model::{CadrecError, CorrectionEntry, CorrectionSet, RunContext};

use crate::store::RecordStore;

#[derive(Debug, Default)]
pub struct CorrectionLedger {
    entries: Vec<CorrectionEntry>,
}

impl CorrectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full audit trail in application order. Entries are never edited
    /// or removed.
    pub fn entries(&self) -> &[CorrectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply one named correction set. Returns the number of records
    /// actually changed.
    ///
    /// Sets are applied in their declared order by the pipeline; when a later
    /// set touches a field an earlier set already corrected, the later set
    /// overrides it (and both changes remain in the audit trail).
    pub fn apply(&mut self, store: &mut RecordStore, set: &CorrectionSet) -> usize {
        let mut changed_records = 0usize;
        for (case_key, field_updates) in &set.entries {
            let positions: Vec<usize> = store.indices_for(case_key).to_vec();
            for position in positions {
                let mut record_changed = false;
                for (field, new_value) in field_updates {
                    let record = store.record_mut(position);
                    let current = record.get(field).map(str::to_string);
                    if current.as_deref() == Some(new_value.as_str()) {
                        continue; // idempotent: no entry, no mutation
                    }
                    record
                        .fields
                        .insert(field.clone(), new_value.clone());
                    self.entries.push(CorrectionEntry {
                        timestamp: Utc::now(),
                        case_key: case_key.clone(),
                        field: field.clone(),
                        old_value: current,
                        new_value: new_value.clone(),
                        correction_type: set.correction_type.clone(),
                    });
                    record_changed = true;
                }
                if record_changed {
                    changed_records += 1;
                }
            }
        }
        info!(
            set = %set.name,
            changed = changed_records,
            ledger_len = self.entries.len(),
            "correction set applied"
        );
        changed_records
    }

    /// Apply one rule-based correction across the store.
    ///
    /// The rule fires on records whose `match_field` matches the pattern.
    /// With `only_if_blank`, the target must be blank; otherwise the
    /// classifier must rank the candidate strictly better than the current
    /// value. Flagging a candidate that is not an improvement does nothing.
    pub fn apply_rule(
        &mut self,
        store: &mut RecordStore,
        rule: &CorrectionRule,
        classifier: &AddressClassifier,
    ) -> Result<usize, CadrecError> {
        let pattern = Regex::new(&rule.pattern).map_err(|error| {
            CadrecError::CorrectionApply {
                set_name: rule.name.clone(),
                reason: format!("invalid pattern: {error}"),
            }
        })?;

        // Single predicate pass collecting matches, then targeted mutation.
        let matches: Vec<usize> = store
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record
                    .get(&rule.match_field)
                    .is_some_and(|value| pattern.is_match(value))
            })
            .map(|(position, _)| position)
            .collect();

        let mut changed = 0usize;
        for position in matches {
            let record = store.record_mut(position);
            let current = record.get(&rule.target_field).unwrap_or("");
            let improves = if rule.only_if_blank {
                current.trim().is_empty()
            } else {
                classifier.classify(&rule.value).rank() > classifier.classify(current).rank()
            };
            if !improves || current == rule.value {
                continue;
            }
            let old_value = record
                .get(&rule.target_field)
                .map(str::to_string)
                .filter(|value| !value.is_empty());
            let case_key = record.case_key.clone();
            record
                .fields
                .insert(rule.target_field.clone(), rule.value.clone());
            self.entries.push(CorrectionEntry {
                timestamp: Utc::now(),
                case_key,
                field: rule.target_field.clone(),
                old_value,
                new_value: rule.value.clone(),
                correction_type: rule.correction_type.clone(),
            });
            changed += 1;
        }
        info!(rule = %rule.name, changed, "correction rule applied");
        Ok(changed)
    }

    /// Apply manual sets in declared order, then rule-based corrections.
    ///
    /// A failing set or rule is logged, recorded on the context, and
    /// skipped; it never aborts the remaining sets.
    pub fn apply_all(
        &mut self,
        store: &mut RecordStore,
        sets: &[CorrectionSet],
        rules: &[CorrectionRule],
        classifier: &AddressClassifier,
        context: &mut RunContext,
    ) -> usize {
        let mut total_changed = 0usize;
        for set in sets {
            total_changed += self.apply(store, set);
        }
        for rule in rules {
            match self.apply_rule(store, rule, classifier) {
                Ok(changed) => total_changed += changed,
                Err(error) => {
                    warn!(rule = %rule.name, %error, "correction rule skipped");
                    context
                        .correction_sets_skipped
                        .insert(rule.name.clone(), error.to_string());
                }
            }
        }
        total_changed
    }
}
