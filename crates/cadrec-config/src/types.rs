//! Configuration file structure.
//!
//! One TOML document configures the whole engine: the canonical schema
//! registry, quality weights, validation rules, sampling parameters, matching
//! knobs, and rule-based correction declarations. Everything here is plain
//! serde data; compiled regexes live with the components that use them.

use serde::{Deserialize, Serialize};

use cadrec_model::{QualityWeights, SchemaRegistry, ValidationRule};

/// How the sampling validator draws its sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    Stratified,
    Systematic,
    Random,
}

impl SamplingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stratified => "stratified",
            Self::Systematic => "systematic",
            Self::Random => "random",
        }
    }

    /// Parse a method name (case-insensitive). Unknown methods are a fatal
    /// configuration error at the call site.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "stratified" => Some(Self::Stratified),
            "systematic" => Some(Self::Systematic),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Per-severity pass-rate thresholds used in the validation report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub critical: f64,
    pub important: f64,
    pub optional: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: 98.0,
            important: 95.0,
            optional: 90.0,
        }
    }
}

/// Sampling validator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub method: SamplingMethod,
    /// Fixed seed: same seed + same input must yield the same sample.
    pub seed: u64,
    pub target_sample_size: usize,
    /// Strata below this population collapse into the `Other` bucket.
    pub min_stratum_size: usize,
    /// Categorical field for the stratified method.
    #[serde(default)]
    pub stratify_by: Option<String>,
    #[serde(default)]
    pub thresholds: SeverityThresholds,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            method: SamplingMethod::Stratified,
            seed: 20_240_817,
            target_sample_size: 1_000,
            min_stratum_size: 50,
            stratify_by: Some("Incident".to_string()),
            thresholds: SeverityThresholds::default(),
        }
    }
}

/// Match engine knobs. `batch_size` is a progress-reporting knob only and
/// never affects results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_true")]
    pub exclude_supplements: bool,
    /// Secondary fields copied into each match result.
    pub copy_fields: Vec<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    50_000
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            exclude_supplements: true,
            copy_fields: vec!["Disposition".to_string(), "Officer".to_string()],
            batch_size: default_batch_size(),
        }
    }
}

/// A rule-based correction: when `match_field` matches `pattern` and the
/// target field is blank (or `only_if_blank` is off), backfill `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub name: String,
    pub correction_type: String,
    pub match_field: String,
    pub pattern: String,
    pub target_field: String,
    pub value: String,
    #[serde(default = "default_true")]
    pub only_if_blank: bool,
}

/// The complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub registry: SchemaRegistry,
    pub quality_weights: QualityWeights,
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub correction_rules: Vec<CorrectionRule>,
}
