//! Address/value classification.
//!
//! A pure, total decision function over a fixed ordered rule list: the first
//! matching category wins, so the function is deterministic and exhaustive.
//! Consumers: the quality scorer (completeness signal), the correction ledger
//! (is a backfill candidate actually better), and the sampling validator
//! (rule predicate).

use std::sync::OnceLock;

use regex::Regex;

/// Every value falls into exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressCategory {
    Blank,
    PoBox,
    GenericLocation,
    IncompleteIntersection,
    ValidIntersection,
    MissingStreetType,
    MissingStreetNumber,
    MissingCityStateZip,
    ValidStandard,
}

impl AddressCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::PoBox => "po_box",
            Self::GenericLocation => "generic_location",
            Self::IncompleteIntersection => "incomplete_intersection",
            Self::ValidIntersection => "valid_intersection",
            Self::MissingStreetType => "missing_street_type",
            Self::MissingStreetNumber => "missing_street_number",
            Self::MissingCityStateZip => "missing_city_state_zip",
            Self::ValidStandard => "valid_standard",
        }
    }

    /// Usable for geocoding and scoring.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::ValidStandard | Self::ValidIntersection)
    }

    /// Completeness ordering used when deciding whether a backfill candidate
    /// improves on the current value. Higher is more complete.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Blank => 0,
            Self::GenericLocation => 1,
            Self::IncompleteIntersection => 2,
            Self::MissingStreetNumber => 3,
            Self::MissingStreetType => 3,
            Self::MissingCityStateZip => 4,
            Self::PoBox => 5,
            Self::ValidIntersection => 6,
            Self::ValidStandard => 7,
        }
    }
}

const STREET_SUFFIXES: &[&str] = &[
    "ST", "AVE", "AV", "RD", "DR", "LN", "CT", "BLVD", "WAY", "PL", "CIR", "TRL", "PKWY", "HWY",
    "TER", "LOOP", "RUN", "XING",
];

fn po_box_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^P\.?\s*O\.?\s*BOX\b").expect("static pattern"))
}

fn leading_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\s+\S").expect("static pattern"))
}

/// Classifier configured with the run's placeholder-location vocabulary.
#[derive(Debug, Clone, Default)]
pub struct AddressClassifier {
    generic_terms: Vec<String>,
}

impl AddressClassifier {
    pub fn new(generic_terms: &[String]) -> Self {
        Self {
            generic_terms: generic_terms
                .iter()
                .map(|term| term.trim().to_uppercase())
                .collect(),
        }
    }

    /// Classify a value. Total: every string input, including empty and
    /// non-ASCII, lands in exactly one category.
    pub fn classify(&self, value: &str) -> AddressCategory {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return AddressCategory::Blank;
        }

        if po_box_pattern().is_match(trimmed) {
            return AddressCategory::PoBox;
        }

        let upper = trimmed.to_uppercase();
        if self.generic_terms.iter().any(|term| *term == upper) {
            return AddressCategory::GenericLocation;
        }

        if let Some((left, right)) = split_intersection(&upper) {
            if left.trim().is_empty() || right.trim().is_empty() {
                return AddressCategory::IncompleteIntersection;
            }
            if has_street_suffix(left) && has_street_suffix(right) {
                return AddressCategory::ValidIntersection;
            }
            // Both components present, but at least one side lacks a
            // recognized suffix.
            return AddressCategory::MissingStreetType;
        }

        let has_number = leading_number_pattern().is_match(&upper);
        let has_suffix = has_street_suffix(&upper);

        // A bare name ("MAIN") lacks both; it must never classify as valid.
        if !has_suffix {
            return AddressCategory::MissingStreetType;
        }
        if !has_number {
            return AddressCategory::MissingStreetNumber;
        }
        if !upper.contains(',') {
            return AddressCategory::MissingCityStateZip;
        }
        AddressCategory::ValidStandard
    }
}

/// Split on the first intersection separator token, if any.
fn split_intersection(value: &str) -> Option<(&str, &str)> {
    if let Some(position) = value.find('&') {
        return Some((&value[..position], &value[position + 1..]));
    }
    if let Some(position) = value.find('/') {
        return Some((&value[..position], &value[position + 1..]));
    }
    if let Some(position) = value.find(" AND ") {
        return Some((&value[..position], &value[position + 5..]));
    }
    None
}

/// True when any whitespace-delimited token is a recognized street suffix.
/// Input is already uppercased.
fn has_street_suffix(component: &str) -> bool {
    component
        .split_whitespace()
        .map(|token| token.trim_end_matches([',', '.']))
        .any(|token| STREET_SUFFIXES.contains(&token))
}
