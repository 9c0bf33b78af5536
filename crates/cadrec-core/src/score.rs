//! Weighted quality scoring.
//!
//! Each component is a boolean indicator over the record (and its match
//! result); the score is the weight-sum of true indicators, clamped to
//! [0, 100]. Pure and deterministic given `(record, weights)` — no hidden
//! state, no I/O.

use cadrec_map::AddressClassifier;
use cadrec_model::{
    CadrecError, CanonicalRecord, MatchResult, QualityScore, QualityWeights, Result,
};

/// Component names the scorer understands. Weight maps naming anything else
/// are a configuration error.
pub const COMPONENTS: &[&str] = &[
    "case",
    "address",
    "call_time",
    "dispatch_time",
    "match",
    "officer",
];

const ADDRESS_FIELD: &str = "FullAddress2";
const CALL_TIME_FIELD: &str = "CallDateTime";
const DISPATCH_TIME_FIELD: &str = "DispatchDateTime";
const OFFICER_FIELD: &str = "Officer";

#[derive(Debug)]
pub struct QualityScorer<'a> {
    weights: &'a QualityWeights,
    classifier: &'a AddressClassifier,
}

impl<'a> QualityScorer<'a> {
    /// Fails loudly on an invalid weight map: a sum above 100, a negative
    /// weight, or an unknown component name.
    pub fn new(weights: &'a QualityWeights, classifier: &'a AddressClassifier) -> Result<Self> {
        weights.validate()?;
        if let Some(unknown) = weights
            .0
            .keys()
            .find(|name| !COMPONENTS.contains(&name.as_str()))
        {
            return Err(CadrecError::Configuration(format!(
                "unknown quality component '{unknown}'"
            )));
        }
        Ok(Self {
            weights,
            classifier,
        })
    }

    /// Score one record. `match_result` is the record's own result from the
    /// match pass; `None` when no secondary source was provided.
    pub fn score(
        &self,
        record: &CanonicalRecord,
        match_result: Option<&MatchResult>,
    ) -> QualityScore {
        let components = self
            .weights
            .0
            .iter()
            .map(|(name, weight)| {
                let indicator = self.indicator(name, record, match_result);
                (name.clone(), if indicator { *weight } else { 0.0 })
            })
            .collect();
        QualityScore::from_components(components)
    }

    fn indicator(
        &self,
        component: &str,
        record: &CanonicalRecord,
        match_result: Option<&MatchResult>,
    ) -> bool {
        match component {
            "case" => record.valid_case_key && !record.case_key.trim().is_empty(),
            "address" => record
                .get(ADDRESS_FIELD)
                .is_some_and(|value| self.classifier.classify(value).is_usable()),
            "call_time" => record.has_value(CALL_TIME_FIELD),
            "dispatch_time" => record.has_value(DISPATCH_TIME_FIELD),
            "match" => match_result.is_some_and(MatchResult::is_matched),
            "officer" => record.has_value(OFFICER_FIELD),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadrec_model::{IntegrationType, MatchConfidence, SourceSystem};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn weights(entries: &[(&str, f64)]) -> QualityWeights {
        QualityWeights(
            entries
                .iter()
                .map(|(name, weight)| ((*name).to_string(), *weight))
                .collect(),
        )
    }

    fn record(fields: &[(&str, &str)], valid_case_key: bool) -> CanonicalRecord {
        CanonicalRecord {
            case_key: if valid_case_key {
                "24-123456".to_string()
            } else {
                String::new()
            },
            source_system: SourceSystem::Cad,
            fields: fields
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            valid_case_key,
        }
    }

    fn matched() -> MatchResult {
        MatchResult {
            case_key: "24-123456".to_string(),
            integration_type: IntegrationType::CadRmsMatched,
            confidence: MatchConfidence::High,
            matched_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn scenario_weights_score_exactly_65() {
        let weights = weights(&[
            ("case", 20.0),
            ("address", 20.0),
            ("call_time", 10.0),
            ("dispatch_time", 10.0),
            ("match", 25.0),
            ("officer", 15.0),
        ]);
        let classifier = AddressClassifier::default();
        let scorer = QualityScorer::new(&weights, &classifier).expect("valid weights");
        // Case, address, and match true; timestamps and officer absent.
        let record = record(
            &[("FullAddress2", "123 Main St, Springfield, IL 62701")],
            true,
        );
        let score = scorer.score(&record, Some(&matched()));
        assert_eq!(score.total, 65.0);
        assert_eq!(score.components["case"], 20.0);
        assert_eq!(score.components["address"], 20.0);
        assert_eq!(score.components["match"], 25.0);
        assert_eq!(score.components["officer"], 0.0);
    }

    #[test]
    fn rejects_unknown_component() {
        let weights = weights(&[("case", 20.0), ("sparkle", 10.0)]);
        let classifier = AddressClassifier::default();
        let error = QualityScorer::new(&weights, &classifier).expect_err("unknown component");
        assert!(error.is_fatal());
    }

    #[test]
    fn rejects_overweight_map() {
        let weights = weights(&[("case", 80.0), ("match", 30.0)]);
        let classifier = AddressClassifier::default();
        assert!(QualityScorer::new(&weights, &classifier).is_err());
    }

    #[test]
    fn no_match_result_means_no_match_points() {
        let weights = weights(&[("match", 25.0)]);
        let classifier = AddressClassifier::default();
        let scorer = QualityScorer::new(&weights, &classifier).expect("valid weights");
        let score = scorer.score(&record(&[], true), None);
        assert_eq!(score.total, 0.0);
    }

    proptest! {
        /// For every valid weight configuration the score stays in [0, 100].
        #[test]
        fn score_stays_in_bounds(
            case_weight in 0.0f64..=40.0,
            address_weight in 0.0f64..=40.0,
            match_weight in 0.0f64..=20.0,
            has_address in any::<bool>(),
            has_officer in any::<bool>(),
            is_matched in any::<bool>(),
        ) {
            let weights = weights(&[
                ("case", case_weight),
                ("address", address_weight),
                ("match", match_weight),
            ]);
            let classifier = AddressClassifier::default();
            let scorer = QualityScorer::new(&weights, &classifier).expect("weights sum <= 100");
            let mut fields: Vec<(&str, &str)> = Vec::new();
            if has_address {
                fields.push(("FullAddress2", "123 Main St, Springfield, IL 62701"));
            }
            if has_officer {
                fields.push(("Officer", "BADGE 12"));
            }
            let record = record(&fields, true);
            let match_result = matched();
            let result = if is_matched { Some(&match_result) } else { None };
            let score = scorer.score(&record, result);
            prop_assert!((0.0..=100.0).contains(&score.total));
        }
    }
}
