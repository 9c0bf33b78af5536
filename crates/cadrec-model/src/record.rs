//! Source and canonical record types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which stream a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceSystem {
    /// Computer-Aided Dispatch: the primary calls-for-service stream.
    Cad,
    /// Records Management System: the secondary case-outcome stream.
    Rms,
}

impl SourceSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cad => "CAD",
            Self::Rms => "RMS",
        }
    }
}

/// Load-time provenance attached to every source record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source_system: SourceSystem,
    pub source_file: String,
    pub load_timestamp: DateTime<Utc>,
}

/// A raw row as loaded, plus provenance. Never mutated after load.
///
/// Columns keep their file order: when two raw columns resolve to the same
/// canonical field, the later column wins, so order is load-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub columns: Vec<(String, String)>,
    pub provenance: Provenance,
}

impl SourceRecord {
    /// Optional-column access: absence is an ordinary value, not an error.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }
}

/// A record in the canonical schema. Created once per source record by the
/// schema mapper; after that, `fields` is mutated only through correction
/// ledger applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Derived case/report number. Empty when the source row had none; such
    /// records are tagged via `valid_case_key`, never dropped.
    pub case_key: String,
    pub source_system: SourceSystem,
    pub fields: BTreeMap<String, String>,
    pub valid_case_key: bool,
}

impl CanonicalRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// True when `field` is present with a non-blank value.
    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).is_some_and(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_value_treats_blank_as_absent() {
        let mut fields = BTreeMap::new();
        fields.insert("Disposition".to_string(), "  ".to_string());
        fields.insert("Officer".to_string(), "BADGE 12".to_string());
        let record = CanonicalRecord {
            case_key: "24-123456".to_string(),
            source_system: SourceSystem::Cad,
            fields,
            valid_case_key: true,
        };
        assert!(!record.has_value("Disposition"));
        assert!(record.has_value("Officer"));
        assert!(!record.has_value("Narrative"));
    }
}
