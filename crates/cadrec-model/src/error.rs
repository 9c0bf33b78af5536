use thiserror::Error;

/// Error taxonomy for a reconciliation run.
///
/// `Configuration` is fatal and aborts the run before any record is touched.
/// Every other variant is recoverable: the component logs it, bumps the
/// matching counter on [`crate::RunContext`], and continues.
#[derive(Debug, Error)]
pub enum CadrecError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("schema mismatch: unmapped column '{column}'")]
    SchemaMismatch { column: String },
    #[error("missing match key for record from {source_file}")]
    MatchKeyMissing { source_file: String },
    #[error("correction set '{set_name}' failed to apply: {reason}")]
    CorrectionApply { set_name: String, reason: String },
    #[error("validation rule '{rule_id}' could not be evaluated: {reason}")]
    ValidationRule { rule_id: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CadrecError {
    /// True for errors that must abort the run before any mutation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, CadrecError>;
