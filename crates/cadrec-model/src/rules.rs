//! Validation rule definitions.
//!
//! Rules are pure data loaded from configuration; evaluation lives in
//! `cadrec-validate`. The predicate is a tagged [`RuleKind`] variant rather
//! than a string-dispatched identifier, so adding a rule never touches
//! dispatch code.

use serde::{Deserialize, Serialize};

/// Severity tier. Tier weights for the overall validation score are fixed:
/// critical 0.5, important 0.3, optional 0.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Important,
    Optional,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Optional => "optional",
        }
    }

    /// Parse a severity from a string (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "important" => Some(Self::Important),
            "optional" => Some(Self::Optional),
            _ => None,
        }
    }

    /// Weight of this tier in the overall validation score.
    pub fn tier_weight(&self) -> f64 {
        match self {
            Self::Critical => 0.5,
            Self::Important => 0.3,
            Self::Optional => 0.2,
        }
    }
}

/// The predicate a rule evaluates against each sampled record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Case key present and non-empty.
    CaseKeyPresent,
    /// Named field present with a non-blank value.
    FieldPresent { field: String },
    /// Named field matches a regex (blank values fail).
    FieldMatches { field: String, pattern: String },
    /// Address field classifies as a usable category
    /// (valid standard or valid intersection).
    AddressUsable { field: String },
    /// Field value is on the configured valid-disposition list.
    DispositionValid { field: String },
    /// Field parses as a timestamp in one of the accepted formats.
    TimestampParses { field: String },
}

/// One validation rule as loaded from configuration. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    pub id: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default)]
    pub fix_suggestion: Option<String>,
}
