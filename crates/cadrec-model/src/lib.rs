pub mod context;
pub mod correction;
pub mod error;
pub mod matching;
pub mod quality;
pub mod record;
pub mod rules;
pub mod schema;

pub use context::RunContext;
pub use correction::{CorrectionEntry, CorrectionSet};
pub use error::{CadrecError, Result};
pub use matching::{IntegrationType, MatchConfidence, MatchResult};
pub use quality::{QualityScore, QualityWeights};
pub use record::{CanonicalRecord, Provenance, SourceRecord, SourceSystem};
pub use rules::{RuleKind, Severity, ValidationRule};
pub use schema::{
    CanonicalField, FieldGroup, FieldValidation, SchemaRegistry, Transformation,
};
