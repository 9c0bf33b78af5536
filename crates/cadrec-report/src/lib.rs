//! Report and export writers.
//!
//! Everything the engine exposes to the surrounding tooling lands here: the
//! ordered correction audit trail, the per-record quality breakdown, the
//! validation report, and the flagged-records set for manual review.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use cadrec_core::DuplicateFlags;
use cadrec_model::{CanonicalRecord, CorrectionEntry, QualityScore};
use cadrec_validate::ValidationReport;

/// Write the audit trail as CSV, one row per correction entry, in
/// application order.
pub fn write_audit_trail_csv(path: &Path, entries: &[CorrectionEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create audit trail {}", path.display()))?;
    writer
        .write_record([
            "timestamp",
            "case_key",
            "field",
            "old_value",
            "new_value",
            "correction_type",
        ])
        .context("write audit header")?;
    for entry in entries {
        writer
            .write_record([
                entry.timestamp.to_rfc3339().as_str(),
                entry.case_key.as_str(),
                entry.field.as_str(),
                entry.old_value.as_deref().unwrap_or(""),
                entry.new_value.as_str(),
                entry.correction_type.as_str(),
            ])
            .context("write audit row")?;
    }
    writer.flush().context("flush audit trail")?;
    Ok(())
}

/// Write the validation report as pretty JSON.
pub fn write_validation_report_json(path: &Path, report: &ValidationReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize validation report")?;
    std::fs::write(path, json)
        .with_context(|| format!("write validation report {}", path.display()))?;
    Ok(())
}

/// Corpus-level quality summary with a component breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    pub record_count: usize,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Records per 10-point score band, keyed "0-9" .. "90-100".
    pub score_bands: BTreeMap<String, usize>,
    /// Mean points earned per component.
    pub component_means: BTreeMap<String, f64>,
}

impl QualitySummary {
    pub fn from_scores(scores: &[QualityScore]) -> Self {
        if scores.is_empty() {
            return Self {
                record_count: 0,
                mean_score: 0.0,
                min_score: 0.0,
                max_score: 0.0,
                score_bands: BTreeMap::new(),
                component_means: BTreeMap::new(),
            };
        }
        let mut total = 0.0;
        let mut min_score = f64::MAX;
        let mut max_score = f64::MIN;
        let mut score_bands: BTreeMap<String, usize> = BTreeMap::new();
        let mut component_totals: BTreeMap<String, f64> = BTreeMap::new();
        for score in scores {
            total += score.total;
            min_score = min_score.min(score.total);
            max_score = max_score.max(score.total);
            *score_bands.entry(band_label(score.total)).or_insert(0) += 1;
            for (component, points) in &score.components {
                *component_totals.entry(component.clone()).or_insert(0.0) += points;
            }
        }
        let count = scores.len() as f64;
        Self {
            record_count: scores.len(),
            mean_score: total / count,
            min_score,
            max_score,
            score_bands,
            component_means: component_totals
                .into_iter()
                .map(|(component, sum)| (component, sum / count))
                .collect(),
        }
    }
}

fn band_label(score: f64) -> String {
    let band = (score / 10.0).floor().min(9.0) as u32 * 10;
    if band == 90 {
        "90-100".to_string()
    } else {
        format!("{band}-{}", band + 9)
    }
}

/// Write the quality summary as pretty JSON.
pub fn write_quality_summary_json(path: &Path, summary: &QualitySummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize quality summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("write quality summary {}", path.display()))?;
    Ok(())
}

/// Write flagged duplicates and merge artifacts for manual review.
pub fn write_review_csv(
    path: &Path,
    records: &[CanonicalRecord],
    flags: &DuplicateFlags,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create review export {}", path.display()))?;
    writer
        .write_record(["flag", "case_key", "source_system", "fields"])
        .context("write review header")?;

    let mut rows: Vec<(&str, usize)> = flags
        .exact_duplicates
        .iter()
        .map(|&position| ("exact_duplicate", position))
        .chain(
            flags
                .merge_artifacts
                .iter()
                .map(|&position| ("merge_artifact", position)),
        )
        .collect();
    rows.sort_by_key(|&(_, position)| position);

    for (flag, position) in rows {
        let Some(record) = records.get(position) else {
            continue;
        };
        let fields = record
            .fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        writer
            .write_record([
                flag,
                record.case_key.as_str(),
                record.source_system.as_str(),
                fields.as_str(),
            ])
            .context("write review row")?;
    }
    writer.flush().context("flush review export")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn score(total: f64, components: &[(&str, f64)]) -> QualityScore {
        QualityScore {
            total,
            components: components
                .iter()
                .map(|(name, points)| ((*name).to_string(), *points))
                .collect(),
        }
    }

    #[test]
    fn summary_aggregates_bands_and_component_means() {
        let scores = vec![
            score(65.0, &[("case", 20.0), ("match", 25.0)]),
            score(95.0, &[("case", 20.0), ("match", 25.0)]),
            score(20.0, &[("case", 20.0), ("match", 0.0)]),
        ];
        let summary = QualitySummary::from_scores(&scores);
        assert_eq!(summary.record_count, 3);
        assert!((summary.mean_score - 60.0).abs() < 1e-9);
        assert_eq!(summary.score_bands["60-69"], 1);
        assert_eq!(summary.score_bands["90-100"], 1);
        assert_eq!(summary.score_bands["20-29"], 1);
        assert!((summary.component_means["case"] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn summary_snapshot() {
        let scores = vec![
            score(65.0, &[("case", 20.0), ("address", 20.0), ("match", 25.0)]),
            score(100.0, &[("case", 20.0), ("address", 20.0), ("match", 25.0)]),
        ];
        let summary = QualitySummary::from_scores(&scores);
        insta::assert_json_snapshot!(summary, @r#"
        {
          "record_count": 2,
          "mean_score": 82.5,
          "min_score": 65.0,
          "max_score": 100.0,
          "score_bands": {
            "60-69": 1,
            "90-100": 1
          },
          "component_means": {
            "address": 20.0,
            "case": 20.0,
            "match": 25.0
          }
        }
        "#);
    }

    #[test]
    fn audit_trail_round_trips_through_csv() {
        let entries = vec![CorrectionEntry {
            timestamp: chrono::Utc::now(),
            case_key: "24-123456".to_string(),
            field: "FullAddress2".to_string(),
            old_value: None,
            new_value: "Location Per CAD System".to_string(),
            correction_type: "address_fix".to_string(),
        }];
        let file = tempfile::NamedTempFile::new().expect("temp file");
        write_audit_trail_csv(file.path(), &entries).expect("write audit trail");
        let content = std::fs::read_to_string(file.path()).expect("read back");
        assert!(content.starts_with("timestamp,case_key,field"));
        assert!(content.contains("address_fix"));
        assert!(content.contains("Location Per CAD System"));
    }

    #[test]
    fn review_export_orders_rows_by_record_position() {
        let make = |case_key: &str| CanonicalRecord {
            case_key: case_key.to_string(),
            source_system: cadrec_model::SourceSystem::Cad,
            fields: BTreeMap::new(),
            valid_case_key: true,
        };
        let records = vec![make("24-000001"), make("24-000002"), make("24-000003")];
        let flags = DuplicateFlags {
            exact_duplicates: vec![2],
            merge_artifacts: vec![0],
        };
        let file = tempfile::NamedTempFile::new().expect("temp file");
        write_review_csv(file.path(), &records, &flags).expect("write review");
        let content = std::fs::read_to_string(file.path()).expect("read back");
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[1].starts_with("merge_artifact,24-000001"));
        assert!(lines[2].starts_with("exact_duplicate,24-000003"));
    }
}
