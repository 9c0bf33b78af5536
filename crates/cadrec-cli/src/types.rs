//! Result types handed from commands to the summary renderer.

use std::path::PathBuf;

use cadrec_model::RunContext;
use cadrec_validate::ValidationReport;

/// Outcome of a `run` invocation.
pub struct RunResult {
    pub output_dir: PathBuf,
    pub cad_rows: usize,
    pub rms_rows: Option<usize>,
    /// Matched / CAD-only counts; zero/zero for a CAD-only run.
    pub matched: usize,
    pub cad_only: usize,
    pub correction_entries: usize,
    pub correction_sets_applied: usize,
    pub flagged_records: usize,
    pub mean_score: f64,
    pub context: RunContext,
    /// Report files written, in write order. Empty on a dry run.
    pub reports: Vec<PathBuf>,
}

impl RunResult {
    /// True when recoverable errors accumulated during the run.
    pub fn has_errors(&self) -> bool {
        self.context.recoverable_error_count() > 0
    }
}

/// Outcome of a `validate` invocation.
pub struct ValidateResult {
    pub run: RunResult,
    pub report: ValidationReport,
    pub report_path: Option<PathBuf>,
}

impl ValidateResult {
    /// True when any severity tier misses its pass-rate threshold.
    pub fn below_threshold(&self) -> bool {
        self.report.tiers.iter().any(|tier| !tier.meets_threshold)
    }
}
