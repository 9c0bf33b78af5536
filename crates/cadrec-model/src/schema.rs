//! Canonical schema definitions.
//!
//! The schema registry is loaded once per run and immutable afterwards. Each
//! [`CanonicalField`] declares its aliases, transformations, and validation
//! patterns; the mapper in `cadrec-map` consumes these declarations without
//! any hard-coded field knowledge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Logical grouping for canonical fields, used in reports and completeness
/// summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldGroup {
    Identity,
    Temporal,
    Spatial,
    Outcome,
    Narrative,
    Other,
}

impl FieldGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Temporal => "temporal",
            Self::Spatial => "spatial",
            Self::Outcome => "outcome",
            Self::Narrative => "narrative",
            Self::Other => "other",
        }
    }
}

impl Default for FieldGroup {
    fn default() -> Self {
        Self::Other
    }
}

/// A declarative per-field transformation, applied in declaration order after
/// renaming and before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transformation {
    /// Keep only the first capture group of `pattern`; leave the value
    /// untouched when the pattern does not match.
    RegexExtract { pattern: String },
    /// Expand an abbreviation to its full form on exact (case-insensitive)
    /// match of the whole value.
    ExpandAbbreviation { from: String, to: String },
    /// Append a default suffix (e.g. ", Springfield, IL") when the value is
    /// non-empty and does not already contain `marker`.
    AppendDefault { marker: String, suffix: String },
    /// Derive the value from another canonical field when this one is empty.
    DeriveFrom { field: String },
    /// Uppercase the value.
    Uppercase,
    /// Collapse internal whitespace runs and trim.
    NormalizeWhitespace,
}

/// Validation patterns for a canonical field: a primary regex and an optional
/// fallback accepted with a warning. Validation failures are counted, never
/// fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub pattern: String,
    #[serde(default)]
    pub fallback: Option<String>,
}

/// One canonical field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalField {
    pub name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub group: FieldGroup,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default)]
    pub validation: Option<FieldValidation>,
}

impl CanonicalField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: BTreeSet::new(),
            required: false,
            group: FieldGroup::Other,
            transformations: Vec::new(),
            validation: None,
        }
    }

    /// True when `raw` matches this field's name or any alias,
    /// case-insensitively.
    pub fn matches(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.name.eq_ignore_ascii_case(raw)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(raw))
    }
}

/// The full canonical schema for a run: ordered field declarations plus the
/// designated case-key column and the configured placeholder/disposition
/// vocabularies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistry {
    /// Canonical field declarations, in declaration order.
    pub fields: Vec<CanonicalField>,
    /// Canonical name of the case-key field (e.g. "CaseNumber").
    pub case_key_field: String,
    /// Placeholder location terms for the address classifier
    /// (e.g. "UNKNOWN", "CITY LIMITS").
    pub generic_location_terms: Vec<String>,
    /// The authoritative valid-disposition list. Configuration, not code.
    pub valid_dispositions: Vec<String>,
}

impl SchemaRegistry {
    /// Case-insensitive lookup of the canonical name for a raw column.
    pub fn resolve(&self, raw_field_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.matches(raw_field_name))
            .map(|field| field.name.as_str())
    }

    pub fn field(&self, canonical_name: &str) -> Option<&CanonicalField> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(canonical_name))
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &CanonicalField> {
        self.fields.iter().filter(|field| field.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        let mut case = CanonicalField::new("CaseNumber");
        case.aliases.insert("Case #".to_string());
        case.aliases.insert("IncidentNumber".to_string());
        case.required = true;
        case.group = FieldGroup::Identity;
        SchemaRegistry {
            fields: vec![case, CanonicalField::new("FullAddress2")],
            case_key_field: "CaseNumber".to_string(),
            generic_location_terms: vec!["UNKNOWN".to_string()],
            valid_dispositions: vec!["ARREST".to_string()],
        }
    }

    #[test]
    fn resolve_is_case_insensitive_over_names_and_aliases() {
        let registry = registry();
        assert_eq!(registry.resolve("casenumber"), Some("CaseNumber"));
        assert_eq!(registry.resolve("case #"), Some("CaseNumber"));
        assert_eq!(registry.resolve("INCIDENTNUMBER"), Some("CaseNumber"));
        assert_eq!(registry.resolve("Narrative"), None);
    }

    #[test]
    fn transformations_serialize_with_kind_tag() {
        let transform = Transformation::RegexExtract {
            pattern: r"^(\d{2}-\d{6})".to_string(),
        };
        let json = serde_json::to_string(&transform).expect("serialize transform");
        assert!(json.contains("regex_extract"));
        let round: Transformation = serde_json::from_str(&json).expect("deserialize transform");
        assert_eq!(round, transform);
    }
}
