//! Configuration loading and validation.
//!
//! All fatal checks happen here, before any record is touched: a run either
//! starts from a fully validated [`EngineConfig`] or aborts with a
//! configuration error.

mod defaults;
mod error;
mod types;

use std::collections::BTreeSet;
use std::path::Path;

pub use defaults::{default_correction_rules, default_registry, default_rules, default_weights};
pub use error::ConfigError;
pub use types::{
    CorrectionRule, EngineConfig, MatchingConfig, SamplingConfig, SamplingMethod,
    SeverityThresholds,
};

use cadrec_model::{RuleKind, Transformation};

/// Load a config file and validate it.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig = toml::from_str(&raw).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// The compiled-in defaults, validated. Validation of the defaults cannot
/// fail; the check still runs so drift in the defaults is caught by tests.
pub fn default_config() -> Result<EngineConfig, ConfigError> {
    let config = EngineConfig::default();
    validate(&config)?;
    Ok(config)
}

/// Validate an engine configuration. Every rejection here is fatal.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let registry = &config.registry;
    if registry.fields.is_empty() {
        return Err(ConfigError::invalid("schema registry declares no fields"));
    }

    let mut seen = BTreeSet::new();
    for field in &registry.fields {
        if !seen.insert(field.name.to_lowercase()) {
            return Err(ConfigError::invalid(format!(
                "duplicate canonical field '{}'",
                field.name
            )));
        }
        for transformation in &field.transformations {
            if let Transformation::RegexExtract { pattern } = transformation {
                check_pattern(pattern, &field.name)?;
            }
        }
        if let Some(validation) = &field.validation {
            check_pattern(&validation.pattern, &field.name)?;
            if let Some(fallback) = &validation.fallback {
                check_pattern(fallback, &field.name)?;
            }
        }
    }

    if registry.resolve(&registry.case_key_field).is_none() {
        return Err(ConfigError::invalid(format!(
            "case key field '{}' is not declared in the registry",
            registry.case_key_field
        )));
    }

    config
        .quality_weights
        .validate()
        .map_err(|error| ConfigError::invalid(error.to_string()))?;

    let mut rule_ids = BTreeSet::new();
    for rule in &config.rules {
        if !rule_ids.insert(rule.id.clone()) {
            return Err(ConfigError::invalid(format!(
                "duplicate validation rule id '{}'",
                rule.id
            )));
        }
        if let RuleKind::FieldMatches { pattern, .. } = &rule.kind {
            check_pattern(pattern, &rule.id)?;
        }
    }

    for rule in &config.correction_rules {
        check_pattern(&rule.pattern, &rule.name)?;
    }

    let sampling = &config.sampling;
    if sampling.target_sample_size == 0 {
        return Err(ConfigError::invalid("target sample size must be positive"));
    }
    if sampling.method == SamplingMethod::Stratified && sampling.stratify_by.is_none() {
        return Err(ConfigError::invalid(
            "stratified sampling requires a stratify_by field",
        ));
    }

    if config.matching.batch_size == 0 {
        return Err(ConfigError::invalid("match batch size must be positive"));
    }

    Ok(())
}

fn check_pattern(pattern: &str, owner: &str) -> Result<(), ConfigError> {
    regex::Regex::new(pattern).map_err(|error| {
        ConfigError::invalid(format!("invalid pattern for '{owner}': {error}"))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = default_config().expect("defaults validate");
        assert_eq!(config.registry.case_key_field, "CaseNumber");
        let weight_total: f64 = config.quality_weights.0.values().sum();
        assert_eq!(weight_total, 100.0);
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let mut config = EngineConfig::default();
        let duplicate = config.registry.fields[0].clone();
        config.registry.fields.push(duplicate);
        let error = validate(&config).expect_err("duplicate field must be rejected");
        assert!(error.to_string().contains("duplicate canonical field"));
    }

    #[test]
    fn rejects_overweight_quality_map() {
        let mut config = EngineConfig::default();
        config
            .quality_weights
            .0
            .insert("extra".to_string(), 50.0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_bad_correction_pattern() {
        let mut config = EngineConfig::default();
        config.correction_rules[0].pattern = "([unclosed".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_stratified_without_stratum_field() {
        let mut config = EngineConfig::default();
        config.sampling.stratify_by = None;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_sampling_method_fails_at_parse() {
        assert_eq!(SamplingMethod::parse("cluster"), None);
        assert_eq!(
            SamplingMethod::parse("Systematic"),
            Some(SamplingMethod::Systematic)
        );
    }

    #[test]
    fn loads_partial_toml_over_defaults_sections() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
[registry]
case_key_field = "CaseNumber"
generic_location_terms = []
valid_dispositions = ["ARREST"]

[[registry.fields]]
name = "CaseNumber"
required = true
group = "identity"

[quality_weights]
case = 50.0
address = 50.0
"#
        )
        .expect("write config");
        let config = load_config(file.path()).expect("config loads");
        assert_eq!(config.registry.fields.len(), 1);
        assert_eq!(config.quality_weights.get("case"), 50.0);
        // Unspecified sections fall back to serde defaults.
        assert_eq!(config.sampling.min_stratum_size, 50);
    }
}
