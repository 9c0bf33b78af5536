//! Match result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a primary record relates to the secondary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationType {
    CadOnly,
    CadRmsMatched,
}

impl IntegrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CadOnly => "CAD_ONLY",
            Self::CadRmsMatched => "CAD_RMS_MATCHED",
        }
    }
}

/// Confidence for a match. Matching is deterministic key-based, so the only
/// levels are no-match and exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchConfidence {
    None,
    High,
}

/// One per primary record, set once during matching and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub case_key: String,
    pub integration_type: IntegrationType,
    pub confidence: MatchConfidence,
    /// Designated secondary fields copied from the RMS side (e.g.
    /// Disposition, Officer). Empty for `CadOnly` results.
    pub matched_fields: BTreeMap<String, String>,
}

impl MatchResult {
    pub fn unmatched(case_key: impl Into<String>) -> Self {
        Self {
            case_key: case_key.into(),
            integration_type: IntegrationType::CadOnly,
            confidence: MatchConfidence::None,
            matched_fields: BTreeMap::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.integration_type == IntegrationType::CadRmsMatched
    }
}
