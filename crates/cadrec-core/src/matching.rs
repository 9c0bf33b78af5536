//! Deterministic key-based matching of primary (CAD) records against the
//! secondary (RMS) stream.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use cadrec_model::{CanonicalRecord, IntegrationType, MatchConfidence, MatchResult};

/// Secondary-side lookup: case key -> designated fields of the first record
/// seen under that key.
pub type SecondaryLookup = BTreeMap<String, BTreeMap<String, String>>;

fn supplement_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Trailing single letter, or S<digits>, after the numeric body; an
    // optional dash separator is tolerated.
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\d-?(?:S\d+|[A-Z])$").expect("static pattern")
    })
}

/// True for supplement case keys (e.g. `24-123456A`, `24-123456S2`), which
/// amend a prior case and would blow up join cardinality if kept.
pub fn is_supplement_key(case_key: &str) -> bool {
    supplement_pattern().is_match(case_key.trim())
}

/// Build the secondary lookup.
///
/// Supplement records are excluded by default. If the same case key appears
/// more than once after exclusion, the first occurrence wins: the result is
/// deterministic in input order, and reordering the input is the only way to
/// change it. (Last-write-wins would silently flip values on reordered
/// input, so the policy is explicit and test-covered.)
pub fn build_lookup(
    secondary_records: &[CanonicalRecord],
    copy_fields: &[String],
    exclude_supplements: bool,
) -> SecondaryLookup {
    let mut lookup = SecondaryLookup::new();
    let mut supplements_skipped = 0usize;
    let mut duplicates_ignored = 0usize;

    for record in secondary_records {
        let case_key = record.case_key.trim();
        if case_key.is_empty() {
            continue;
        }
        if exclude_supplements && is_supplement_key(case_key) {
            supplements_skipped += 1;
            continue;
        }
        if lookup.contains_key(case_key) {
            duplicates_ignored += 1;
            continue;
        }
        let mut fields = BTreeMap::new();
        for name in copy_fields {
            if let Some(value) = record.get(name) {
                fields.insert(name.clone(), value.to_string());
            }
        }
        lookup.insert(case_key.to_string(), fields);
    }

    info!(
        keys = lookup.len(),
        supplements_skipped, duplicates_ignored, "secondary lookup built"
    );
    lookup
}

/// Match every primary record against the lookup. Exactly one result per
/// primary record: present non-empty keys match `CadRmsMatched/High`, the
/// rest are `CadOnly/None`.
///
/// `batch_size` chunks the pass purely for progress reporting; the callback
/// receives the running record count after each batch. Batch boundaries
/// never affect results.
pub fn match_records(
    primary_records: &[CanonicalRecord],
    lookup: &SecondaryLookup,
    batch_size: usize,
    mut on_batch: impl FnMut(usize),
) -> Vec<MatchResult> {
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(primary_records.len());

    for batch in primary_records.chunks(batch_size) {
        for record in batch {
            results.push(match_one(record, lookup));
        }
        on_batch(results.len());
        debug!(processed = results.len(), "match batch complete");
    }

    debug_assert_eq!(results.len(), primary_records.len());
    results
}

fn match_one(record: &CanonicalRecord, lookup: &SecondaryLookup) -> MatchResult {
    let case_key = record.case_key.trim();
    if case_key.is_empty() {
        // MatchKeyMissing is recoverable: the record stays CAD_ONLY.
        return MatchResult::unmatched(case_key);
    }
    match lookup.get(case_key) {
        Some(fields) => MatchResult {
            case_key: case_key.to_string(),
            integration_type: IntegrationType::CadRmsMatched,
            confidence: MatchConfidence::High,
            matched_fields: fields.clone(),
        },
        None => MatchResult::unmatched(case_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadrec_model::SourceSystem;

    fn record(case_key: &str, fields: &[(&str, &str)]) -> CanonicalRecord {
        CanonicalRecord {
            case_key: case_key.to_string(),
            source_system: SourceSystem::Rms,
            fields: fields
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
            valid_case_key: !case_key.trim().is_empty(),
        }
    }

    fn copy_fields() -> Vec<String> {
        vec!["Disposition".to_string(), "Officer".to_string()]
    }

    #[test]
    fn supplement_keys_are_recognized() {
        assert!(is_supplement_key("24-123456A"));
        assert!(is_supplement_key("24-123456a"));
        assert!(is_supplement_key("24-123456S2"));
        assert!(is_supplement_key("24-123456-S12"));
        assert!(!is_supplement_key("24-123456"));
        assert!(!is_supplement_key("24-1234"));
    }

    #[test]
    fn first_occurrence_wins_on_duplicate_keys() {
        let records = vec![
            record("24-999999", &[("Disposition", "ARREST")]),
            record("24-999999", &[("Disposition", "ADVISED")]),
        ];
        let lookup = build_lookup(&records, &copy_fields(), true);
        assert_eq!(
            lookup["24-999999"].get("Disposition").map(String::as_str),
            Some("ARREST")
        );
    }

    #[test]
    fn supplements_are_excluded_by_default_but_keepable() {
        let records = vec![
            record("24-123456S2", &[("Disposition", "REPORT")]),
            record("24-123456", &[("Disposition", "ARREST")]),
        ];
        let excluded = build_lookup(&records, &copy_fields(), true);
        assert_eq!(excluded.len(), 1);
        assert!(excluded.contains_key("24-123456"));

        let kept = build_lookup(&records, &copy_fields(), false);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn every_primary_record_gets_exactly_one_result() {
        let secondary = vec![record("24-000001", &[("Disposition", "ARREST")])];
        let lookup = build_lookup(&secondary, &copy_fields(), true);
        let primary = vec![
            record("24-000001", &[]),
            record("24-000002", &[]),
            record("", &[]),
        ];
        let results = match_records(&primary, &lookup, 2, |_| {});
        assert_eq!(results.len(), primary.len());
        let matched = results.iter().filter(|result| result.is_matched()).count();
        let cad_only = results.iter().filter(|result| !result.is_matched()).count();
        assert_eq!(matched + cad_only, primary.len());
        assert_eq!(matched, 1);
        assert_eq!(
            results[0].matched_fields.get("Disposition").map(String::as_str),
            Some("ARREST")
        );
    }

    #[test]
    fn batch_size_does_not_change_results() {
        let secondary = vec![
            record("24-000001", &[("Disposition", "ARREST")]),
            record("24-000003", &[("Disposition", "ADVISED")]),
        ];
        let lookup = build_lookup(&secondary, &copy_fields(), true);
        let primary: Vec<CanonicalRecord> = (1..=7)
            .map(|index| record(&format!("24-00000{index}"), &[]))
            .collect();

        let whole = match_records(&primary, &lookup, 1_000, |_| {});
        let tiny = match_records(&primary, &lookup, 1, |_| {});
        for (left, right) in whole.iter().zip(tiny.iter()) {
            assert_eq!(left.integration_type, right.integration_type);
            assert_eq!(left.matched_fields, right.matched_fields);
        }
    }
}
