//! Rule evaluation over a drawn sample.
//!
//! Each rule's predicate is a [`RuleKind`] variant dispatched here, so new
//! rules mean a new variant and one match arm, never edits to a string
//! dispatch chain.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use cadrec_map::AddressClassifier;
use cadrec_model::{CanonicalRecord, RuleKind, RunContext, Severity, ValidationRule};

/// Maximum failing case keys kept per rule for the report.
pub const MAX_FAILING_EXAMPLES: usize = 10;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Per-rule sample result; extrapolated counts are filled in afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub severity: Severity,
    pub fix_suggestion: Option<String>,
    /// Sampled records the predicate applied to.
    pub sample_applicable: usize,
    pub sample_passed: usize,
    pub sample_failed: usize,
    /// Case keys of up to [`MAX_FAILING_EXAMPLES`] failing records.
    pub failing_examples: Vec<String>,
    /// True when the rule's required field was absent from every sampled
    /// record; such rules report `sample_failed == sample_size` and are
    /// excluded from tier averages.
    pub errored: bool,
    pub sample_pass_rate: f64,
    pub estimated_full_passed: usize,
    pub estimated_full_failed: usize,
    pub estimated_full_pass_rate: f64,
}

/// Evaluates the configured rules against sampled records.
#[derive(Debug)]
pub struct RuleEngine<'a> {
    classifier: &'a AddressClassifier,
    valid_dispositions: Vec<String>,
    patterns: BTreeMap<String, Regex>,
}

impl<'a> RuleEngine<'a> {
    pub fn new(
        classifier: &'a AddressClassifier,
        valid_dispositions: &[String],
        rules: &[ValidationRule],
    ) -> Self {
        let mut patterns = BTreeMap::new();
        for rule in rules {
            if let RuleKind::FieldMatches { pattern, .. } = &rule.kind {
                // Patterns were checked at config load; one that still fails
                // to compile surfaces as a rule error at evaluation time.
                if let Ok(compiled) = Regex::new(pattern) {
                    patterns.insert(rule.id.clone(), compiled);
                }
            }
        }
        Self {
            classifier,
            valid_dispositions: valid_dispositions
                .iter()
                .map(|value| value.trim().to_uppercase())
                .collect(),
            patterns,
        }
    }

    /// Run every rule over the sampled records.
    pub fn evaluate(
        &self,
        population: &[CanonicalRecord],
        sample_indices: &[usize],
        rules: &[ValidationRule],
        context: &mut RunContext,
    ) -> Vec<RuleOutcome> {
        rules
            .iter()
            .map(|rule| self.evaluate_rule(population, sample_indices, rule, context))
            .collect()
    }

    fn evaluate_rule(
        &self,
        population: &[CanonicalRecord],
        sample_indices: &[usize],
        rule: &ValidationRule,
        context: &mut RunContext,
    ) -> RuleOutcome {
        let sample_size = sample_indices.len();
        let mut applicable = 0usize;
        let mut passed = 0usize;
        let mut failing_examples = Vec::new();

        for &position in sample_indices {
            let record = &population[position];
            match self.check(rule, record) {
                Some(true) => {
                    applicable += 1;
                    passed += 1;
                }
                Some(false) => {
                    applicable += 1;
                    if failing_examples.len() < MAX_FAILING_EXAMPLES {
                        failing_examples.push(record.case_key.clone());
                    }
                }
                // Field absent on this record: not applicable.
                None => {}
            }
        }

        if applicable == 0 && sample_size > 0 {
            // The field the predicate needs never appeared in the sample.
            let reason = format!(
                "required field absent from all {sample_size} sampled records"
            );
            warn!(rule = %rule.id, %reason, "validation rule errored");
            context.rule_errors.insert(rule.id.clone(), reason);
            return RuleOutcome {
                rule_id: rule.id.clone(),
                severity: rule.severity,
                fix_suggestion: rule.fix_suggestion.clone(),
                sample_applicable: 0,
                sample_passed: 0,
                sample_failed: sample_size,
                failing_examples: Vec::new(),
                errored: true,
                sample_pass_rate: 0.0,
                estimated_full_passed: 0,
                estimated_full_failed: 0,
                estimated_full_pass_rate: 0.0,
            };
        }

        let failed = applicable - passed;
        let sample_pass_rate = if applicable == 0 {
            0.0
        } else {
            passed as f64 / applicable as f64
        };
        RuleOutcome {
            rule_id: rule.id.clone(),
            severity: rule.severity,
            fix_suggestion: rule.fix_suggestion.clone(),
            sample_applicable: applicable,
            sample_passed: passed,
            sample_failed: failed,
            failing_examples,
            errored: false,
            sample_pass_rate,
            estimated_full_passed: 0,
            estimated_full_failed: 0,
            estimated_full_pass_rate: 0.0,
        }
    }

    /// `None` when the record does not carry the field the predicate needs.
    fn check(&self, rule: &ValidationRule, record: &CanonicalRecord) -> Option<bool> {
        match &rule.kind {
            RuleKind::CaseKeyPresent => {
                Some(record.valid_case_key && !record.case_key.trim().is_empty())
            }
            RuleKind::FieldPresent { field } => {
                record.get(field)?;
                Some(record.has_value(field))
            }
            RuleKind::FieldMatches { field, .. } => {
                let value = record.get(field)?;
                let pattern = self.patterns.get(&rule.id)?;
                Some(!value.trim().is_empty() && pattern.is_match(value.trim()))
            }
            RuleKind::AddressUsable { field } => {
                let value = record.get(field)?;
                Some(self.classifier.classify(value).is_usable())
            }
            RuleKind::DispositionValid { field } => {
                let value = record.get(field)?;
                let upper = value.trim().to_uppercase();
                Some(!upper.is_empty() && self.valid_dispositions.contains(&upper))
            }
            RuleKind::TimestampParses { field } => {
                let value = record.get(field)?;
                Some(parses_as_timestamp(value))
            }
        }
    }
}

fn parses_as_timestamp(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    TIMESTAMP_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(trimmed, format).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadrec_model::SourceSystem;

    fn record(case_key: &str, fields: &[(&str, &str)]) -> CanonicalRecord {
        CanonicalRecord {
            case_key: case_key.to_string(),
            source_system: SourceSystem::Cad,
            fields: fields
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            valid_case_key: !case_key.is_empty(),
        }
    }

    fn rule(id: &str, severity: Severity, kind: RuleKind) -> ValidationRule {
        ValidationRule {
            id: id.to_string(),
            severity,
            kind,
            fix_suggestion: None,
        }
    }

    #[test]
    fn missing_field_marks_rule_errored_with_full_failure() {
        let classifier = AddressClassifier::default();
        let population = vec![record("24-000001", &[]), record("24-000002", &[])];
        let rules = vec![rule(
            "IMP_009",
            Severity::Important,
            RuleKind::FieldPresent {
                field: "NeverLoaded".to_string(),
            },
        )];
        let engine = RuleEngine::new(&classifier, &[], &rules);
        let mut context = RunContext::new();
        let outcomes = engine.evaluate(&population, &[0, 1], &rules, &mut context);
        assert!(outcomes[0].errored);
        assert_eq!(outcomes[0].sample_failed, 2);
        assert!(context.rule_errors.contains_key("IMP_009"));
    }

    #[test]
    fn failing_examples_are_capped_at_ten() {
        let classifier = AddressClassifier::default();
        let population: Vec<CanonicalRecord> = (0..25)
            .map(|index| record(&format!("24-{index:06}"), &[("Disposition", "??")]))
            .collect();
        let indices: Vec<usize> = (0..25).collect();
        let rules = vec![rule(
            "IMP_003",
            Severity::Important,
            RuleKind::DispositionValid {
                field: "Disposition".to_string(),
            },
        )];
        let engine = RuleEngine::new(&classifier, &["ARREST".to_string()], &rules);
        let mut context = RunContext::new();
        let outcomes = engine.evaluate(&population, &indices, &rules, &mut context);
        assert_eq!(outcomes[0].sample_failed, 25);
        assert_eq!(outcomes[0].failing_examples.len(), MAX_FAILING_EXAMPLES);
    }

    #[test]
    fn timestamp_rule_accepts_both_export_formats() {
        let classifier = AddressClassifier::default();
        let population = vec![
            record("24-000001", &[("CallDateTime", "2024-03-01 10:15:00")]),
            record("24-000002", &[("CallDateTime", "3/1/2024 10:15 AM")]),
            record("24-000003", &[("CallDateTime", "yesterday-ish")]),
        ];
        let rules = vec![rule(
            "IMP_002",
            Severity::Important,
            RuleKind::TimestampParses {
                field: "CallDateTime".to_string(),
            },
        )];
        let engine = RuleEngine::new(&classifier, &[], &rules);
        let mut context = RunContext::new();
        let outcomes = engine.evaluate(&population, &[0, 1, 2], &rules, &mut context);
        assert_eq!(outcomes[0].sample_passed, 2);
        assert_eq!(outcomes[0].sample_failed, 1);
    }
}
