//! Explicit run-wide diagnostics, replacing ambient global counters.
//!
//! Every component takes a `&mut RunContext` (or returns a delta merged by the
//! pipeline) so that recoverable errors and mapping statistics never vanish:
//! the final summary renders exactly what accumulated here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunContext {
    /// Canonical field name -> rows where the field mapped.
    pub mapped_fields: BTreeMap<String, u64>,
    /// Raw column name -> rows passed through unmapped.
    pub unmapped_fields: BTreeMap<String, u64>,
    /// Field validation failures by canonical field name.
    pub validation_failures: BTreeMap<String, u64>,
    /// Fields accepted only by their fallback pattern.
    pub fallback_validations: BTreeMap<String, u64>,
    /// Records with an empty or unusable case key.
    pub match_key_missing: u64,
    /// Correction sets skipped due to apply failures, by set name.
    pub correction_sets_skipped: BTreeMap<String, String>,
    /// Validation rules that errored (missing field), by rule id.
    pub rule_errors: BTreeMap<String, String>,
    /// Warnings worth surfacing verbatim (duplicate alias targets etc.).
    pub warnings: Vec<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mapped(&mut self, canonical_name: &str) {
        *self
            .mapped_fields
            .entry(canonical_name.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_unmapped(&mut self, raw_name: &str) {
        *self
            .unmapped_fields
            .entry(raw_name.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_validation_failure(&mut self, canonical_name: &str) {
        *self
            .validation_failures
            .entry(canonical_name.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_fallback_validation(&mut self, canonical_name: &str) {
        *self
            .fallback_validations
            .entry(canonical_name.to_string())
            .or_insert(0) += 1;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Merge another context's counters into this one.
    pub fn absorb(&mut self, other: RunContext) {
        for (key, count) in other.mapped_fields {
            *self.mapped_fields.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.unmapped_fields {
            *self.unmapped_fields.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.validation_failures {
            *self.validation_failures.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.fallback_validations {
            *self.fallback_validations.entry(key).or_insert(0) += count;
        }
        self.match_key_missing += other.match_key_missing;
        self.correction_sets_skipped
            .extend(other.correction_sets_skipped);
        self.rule_errors.extend(other.rule_errors);
        self.warnings.extend(other.warnings);
    }

    /// Total recoverable-error count for the run summary.
    pub fn recoverable_error_count(&self) -> u64 {
        let validation: u64 = self.validation_failures.values().sum();
        validation
            + self.match_key_missing
            + self.correction_sets_skipped.len() as u64
            + self.rule_errors.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_sums_counters() {
        let mut base = RunContext::new();
        base.record_mapped("CaseNumber");
        let mut delta = RunContext::new();
        delta.record_mapped("CaseNumber");
        delta.record_unmapped("MysteryColumn");
        delta.match_key_missing = 3;
        base.absorb(delta);
        assert_eq!(base.mapped_fields["CaseNumber"], 2);
        assert_eq!(base.unmapped_fields["MysteryColumn"], 1);
        assert_eq!(base.match_key_missing, 3);
    }
}
