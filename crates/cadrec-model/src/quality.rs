//! Quality score types and weight configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CadrecError, Result};

/// Weighted scoring configuration: component name -> points. Weights are
/// configuration, not code, and must sum to at most 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights(pub BTreeMap<String, f64>);

impl QualityWeights {
    /// Rejects weight maps summing above 100 or containing negative weights.
    pub fn validate(&self) -> Result<()> {
        let total: f64 = self.0.values().sum();
        if total > 100.0 {
            return Err(CadrecError::Configuration(format!(
                "quality weights sum to {total}, which exceeds 100"
            )));
        }
        if let Some((name, weight)) = self.0.iter().find(|(_, weight)| **weight < 0.0) {
            return Err(CadrecError::Configuration(format!(
                "quality weight '{name}' is negative ({weight})"
            )));
        }
        Ok(())
    }

    pub fn get(&self, component: &str) -> f64 {
        self.0.get(component).copied().unwrap_or(0.0)
    }
}

/// A derived score in [0, 100] with its component breakdown. Recomputed from
/// record state each time it is requested; never itself mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub total: f64,
    pub components: BTreeMap<String, f64>,
}

impl QualityScore {
    pub fn from_components(components: BTreeMap<String, f64>) -> Self {
        let total: f64 = components.values().sum();
        Self {
            total: total.clamp(0.0, 100.0),
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overweight_configuration() {
        let mut weights = QualityWeights::default();
        weights.0.insert("case".to_string(), 60.0);
        weights.0.insert("address".to_string(), 50.0);
        let error = weights.validate().expect_err("should reject sum over 100");
        assert!(error.is_fatal());
    }

    #[test]
    fn accepts_weights_summing_to_exactly_100() {
        let mut weights = QualityWeights::default();
        weights.0.insert("case".to_string(), 40.0);
        weights.0.insert("address".to_string(), 60.0);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn score_total_is_clamped() {
        let mut components = BTreeMap::new();
        components.insert("case".to_string(), 120.0);
        let score = QualityScore::from_components(components);
        assert_eq!(score.total, 100.0);
    }
}
