//! Bulk tabular ingestion.
//!
//! Loads CAD/RMS CSV exports into ordered [`SourceRecord`] sequences with
//! provenance, and manual correction CSVs into [`CorrectionSet`]s. Rows come
//! back in file order; column order within a row is preserved because it is
//! load-bearing for duplicate-alias resolution downstream.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use cadrec_model::{CorrectionSet, Provenance, SourceRecord, SourceSystem};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing expected column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("{path} has no header row")]
    EmptyFile { path: String },
}

/// Per-file load statistics for the run summary.
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub rows: usize,
    pub columns: usize,
    pub blank_rows_skipped: usize,
}

/// Load one source export. Every data row becomes a [`SourceRecord`]; rows
/// that are entirely blank are skipped and counted.
pub fn load_source_csv(
    path: &Path,
    source_system: SourceSystem,
) -> Result<(Vec<SourceRecord>, LoadStats), IngestError> {
    let path_display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| csv_error(&path_display, source))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(&path_display, source))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(IngestError::EmptyFile { path: path_display });
    }

    let load_timestamp = Utc::now();
    let mut records = Vec::new();
    let mut stats = LoadStats {
        columns: headers.len(),
        ..LoadStats::default()
    };

    for row in reader.records() {
        let row = row.map_err(|source| csv_error(&path_display, source))?;
        if row.iter().all(|value| value.trim().is_empty()) {
            stats.blank_rows_skipped += 1;
            continue;
        }
        let columns: Vec<(String, String)> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.clone(), value.trim().to_string()))
            .collect();
        records.push(SourceRecord {
            columns,
            provenance: Provenance {
                source_system,
                source_file: path_display.clone(),
                load_timestamp,
            },
        });
        stats.rows += 1;
    }

    info!(
        file = %path_display,
        system = source_system.as_str(),
        rows = stats.rows,
        skipped = stats.blank_rows_skipped,
        "source file loaded"
    );
    Ok((records, stats))
}

/// Load a manual correction CSV into a correction set.
///
/// Layout: a case-number column (named by `case_key_column`) plus one column
/// per correctable field. Blank cells mean "no correction for this field".
/// A missing case-number column is an error the pipeline treats as a skipped
/// set, never a fatal abort.
pub fn load_correction_csv(
    path: &Path,
    set_name: &str,
    correction_type: &str,
    case_key_column: &str,
) -> Result<CorrectionSet, IngestError> {
    let path_display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| csv_error(&path_display, source))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(&path_display, source))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let key_position = headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(case_key_column))
        .ok_or_else(|| IngestError::MissingColumn {
            path: path_display.clone(),
            column: case_key_column.to_string(),
        })?;

    let mut set = CorrectionSet::new(set_name, correction_type);
    for row in reader.records() {
        let row = row.map_err(|source| csv_error(&path_display, source))?;
        let Some(case_key) = row.get(key_position).map(str::trim) else {
            continue;
        };
        if case_key.is_empty() {
            continue;
        }
        for (position, header) in headers.iter().enumerate() {
            if position == key_position {
                continue;
            }
            let Some(value) = row.get(position).map(str::trim) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            set.insert(case_key, header.clone(), value);
        }
    }

    info!(file = %path_display, set = set_name, cases = set.entries.len(), "correction set loaded");
    Ok(set)
}

fn csv_error(path: &str, source: csv::Error) -> IngestError {
    IngestError::Csv {
        path: path.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{content}").expect("write csv");
        file
    }

    #[test]
    fn loads_rows_in_file_order_with_column_order_preserved() {
        let file = write_temp("Case #,Nature,Address\n24-000001,THEFT,1 Elm St\n24-000002,ALARM,\n");
        let (records, stats) =
            load_source_csv(file.path(), SourceSystem::Cad).expect("load succeeds");
        assert_eq!(stats.rows, 2);
        assert_eq!(records[0].columns[0], ("Case #".to_string(), "24-000001".to_string()));
        assert_eq!(records[0].columns[1].0, "Nature");
        assert_eq!(records[1].get("Nature"), Some("ALARM"));
    }

    #[test]
    fn blank_rows_are_skipped_and_counted() {
        let file = write_temp("Case #,Nature\n24-000001,THEFT\n,\n");
        let (records, stats) =
            load_source_csv(file.path(), SourceSystem::Cad).expect("load succeeds");
        assert_eq!(records.len(), 1);
        assert_eq!(stats.blank_rows_skipped, 1);
    }

    #[test]
    fn correction_csv_maps_case_to_field_updates() {
        let file = write_temp(
            "Case #,FullAddress2,Disposition\n24-000001,9 Oak Ave,\n24-000002,,ARREST\n",
        );
        let set = load_correction_csv(file.path(), "manual", "manual_fix", "Case #")
            .expect("load succeeds");
        assert_eq!(
            set.entries["24-000001"].get("FullAddress2").map(String::as_str),
            Some("9 Oak Ave")
        );
        assert_eq!(
            set.entries["24-000002"].get("Disposition").map(String::as_str),
            Some("ARREST")
        );
        assert!(!set.entries["24-000001"].contains_key("Disposition"));
    }

    #[test]
    fn missing_case_column_is_reported() {
        let file = write_temp("Wrong,Columns\nx,y\n");
        let error = load_correction_csv(file.path(), "manual", "manual_fix", "Case #")
            .expect_err("must fail");
        assert!(error.to_string().contains("Case #"));
    }
}
