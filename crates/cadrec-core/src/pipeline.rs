//! The reconciliation pipeline with explicit stages.
//!
//! Stage order: map → match (when a secondary source exists) → corrections →
//! duplicate detection → scoring. Anything fatal is rejected before the
//! first record is touched; after that every failure is recoverable and
//! accumulates on the [`RunContext`].

use tracing::{info, info_span};

use cadrec_config::EngineConfig;
use cadrec_map::{AddressClassifier, SchemaMapper};
use cadrec_model::{
    CanonicalRecord, CorrectionSet, MatchResult, QualityScore, Result, RunContext, SourceRecord,
};

use crate::dedupe::{self, DuplicateFlags};
use crate::ledger::CorrectionLedger;
use crate::matching::{build_lookup, match_records};
use crate::score::QualityScorer;
use crate::store::RecordStore;

/// Everything a run produces, handed to the reporting layer.
#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<CanonicalRecord>,
    /// One per primary record, in input order. `None` when the run had no
    /// secondary source.
    pub match_results: Option<Vec<MatchResult>>,
    pub ledger: CorrectionLedger,
    pub flags: DuplicateFlags,
    pub scores: Vec<QualityScore>,
    pub context: RunContext,
}

/// Execute a full reconciliation run.
///
/// Idempotent end to end: matching and scoring are pure, and ledger applies
/// are no-ops on unchanged values, so re-running on the same inputs yields
/// identical, non-duplicating results.
pub fn run_pipeline(
    config: &EngineConfig,
    primary: &[SourceRecord],
    secondary: Option<&[SourceRecord]>,
    correction_sets: &[CorrectionSet],
    mut on_match_progress: impl FnMut(usize),
) -> Result<RunOutcome> {
    let classifier = AddressClassifier::new(&config.registry.generic_location_terms);
    // Constructing the scorer first keeps weight errors fatal-before-mutation.
    let scorer = QualityScorer::new(&config.quality_weights, &classifier)?;

    let mut context = RunContext::new();
    let mapper = SchemaMapper::new(&config.registry);

    let span = info_span!("map_stage");
    let canonical: Vec<CanonicalRecord> = {
        let _guard = span.enter();
        primary
            .iter()
            .map(|record| mapper.map(record, &mut context))
            .collect()
    };
    info!(records = canonical.len(), "primary records mapped");

    let match_results = match secondary {
        Some(secondary_records) => {
            let span = info_span!("match_stage");
            let _guard = span.enter();
            let secondary_canonical: Vec<CanonicalRecord> = secondary_records
                .iter()
                .map(|record| mapper.map(record, &mut context))
                .collect();
            let lookup = build_lookup(
                &secondary_canonical,
                &config.matching.copy_fields,
                config.matching.exclude_supplements,
            );
            Some(match_records(
                &canonical,
                &lookup,
                config.matching.batch_size,
                &mut on_match_progress,
            ))
        }
        None => None,
    };

    let mut store = RecordStore::new(canonical);
    let mut ledger = CorrectionLedger::new();
    {
        let span = info_span!("correction_stage");
        let _guard = span.enter();
        let changed = ledger.apply_all(
            &mut store,
            correction_sets,
            &config.correction_rules,
            &classifier,
            &mut context,
        );
        info!(changed, entries = ledger.len(), "corrections applied");
    }

    let flags = dedupe::detect(store.records());

    let records = store.into_records();
    let scores: Vec<QualityScore> = records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let match_result = match_results
                .as_ref()
                .and_then(|results| results.get(position));
            scorer.score(record, match_result)
        })
        .collect();

    Ok(RunOutcome {
        records,
        match_results,
        ledger,
        flags,
        scores,
        context,
    })
}

/// Load correction sets from per-set results, skipping failures.
///
/// Partial-failure semantics: a set whose source failed to load is recorded
/// on the context and dropped; the remaining sets still apply in declared
/// order.
pub fn collect_correction_sets(
    loaded: Vec<(String, std::result::Result<CorrectionSet, String>)>,
    context: &mut RunContext,
) -> Vec<CorrectionSet> {
    let mut sets = Vec::new();
    for (name, outcome) in loaded {
        match outcome {
            Ok(set) => sets.push(set),
            Err(reason) => {
                tracing::warn!(set = %name, %reason, "correction set skipped");
                context.correction_sets_skipped.insert(name, reason);
            }
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadrec_config::default_config;
    use cadrec_model::{Provenance, SourceSystem};
    use chrono::Utc;

    fn source(system: SourceSystem, columns: Vec<(&str, &str)>) -> SourceRecord {
        SourceRecord {
            columns: columns
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            provenance: Provenance {
                source_system: system,
                source_file: "test.csv".to_string(),
                load_timestamp: Utc::now(),
            },
        }
    }

    #[test]
    fn full_run_produces_one_result_per_primary_record() {
        let config = default_config().expect("default config");
        let primary = vec![
            source(
                SourceSystem::Cad,
                vec![("Case #", "24-000001"), ("Nature", "THEFT")],
            ),
            source(
                SourceSystem::Cad,
                vec![("Case #", "24-000002"), ("Nature", "ALARM")],
            ),
        ];
        let secondary = vec![source(
            SourceSystem::Rms,
            vec![("Case #", "24-000001"), ("Dispo", "ARREST")],
        )];

        let outcome = run_pipeline(&config, &primary, Some(&secondary), &[], |_| {})
            .expect("pipeline runs");
        let results = outcome.match_results.expect("secondary present");
        assert_eq!(results.len(), primary.len());
        assert!(results[0].is_matched());
        assert!(!results[1].is_matched());
        assert_eq!(outcome.scores.len(), primary.len());
    }

    #[test]
    fn rerunning_the_pipeline_is_idempotent() {
        let config = default_config().expect("default config");
        let primary = vec![source(
            SourceSystem::Cad,
            vec![("Case #", "24-000001"), ("Nature", "BACKUP")],
        )];

        let first = run_pipeline(&config, &primary, None, &[], |_| {}).expect("first run");
        let second = run_pipeline(&config, &primary, None, &[], |_| {}).expect("second run");

        assert_eq!(first.ledger.len(), second.ledger.len());
        assert_eq!(first.records[0].fields, second.records[0].fields);
        assert_eq!(first.scores[0].total, second.scores[0].total);
    }

    #[test]
    fn backup_rule_fires_during_the_run() {
        let config = default_config().expect("default config");
        let primary = vec![source(
            SourceSystem::Cad,
            vec![("Case #", "24-123456"), ("Nature", "BACKUP")],
        )];
        let outcome =
            run_pipeline(&config, &primary, None, &[], |_| {}).expect("pipeline runs");
        assert_eq!(
            outcome.records[0].get("FullAddress2"),
            Some("Location Per CAD System")
        );
        assert_eq!(outcome.ledger.len(), 1);
        assert_eq!(outcome.ledger.entries()[0].correction_type, "address_fix");
    }

    #[test]
    fn collect_correction_sets_skips_failures() {
        let mut context = RunContext::new();
        let sets = collect_correction_sets(
            vec![
                (
                    "addresses".to_string(),
                    Ok(CorrectionSet::new("addresses", "address_fix")),
                ),
                (
                    "dispositions".to_string(),
                    Err("missing column 'Disposition'".to_string()),
                ),
            ],
            &mut context,
        );
        assert_eq!(sets.len(), 1);
        assert!(context.correction_sets_skipped.contains_key("dispositions"));
        assert_eq!(context.recoverable_error_count(), 1);
    }
}
