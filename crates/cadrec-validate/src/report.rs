//! Extrapolation and the assembled validation report.

use std::collections::BTreeMap;

use serde::Serialize;

use cadrec_config::{SamplingMethod, SeverityThresholds};
use cadrec_model::Severity;

use crate::engine::RuleOutcome;
use crate::sample::SampleStratum;

/// Scale one rule's sample counts to the full population. The pass rate is
/// preserved exactly; only the counts grow, and
/// `estimated_full_passed + estimated_full_failed == population_size` by
/// construction.
pub fn extrapolate_outcome(outcome: &mut RuleOutcome, population_size: usize) {
    let denominator = outcome.sample_passed + outcome.sample_failed;
    if denominator == 0 {
        outcome.estimated_full_passed = 0;
        outcome.estimated_full_failed = 0;
        outcome.estimated_full_pass_rate = 0.0;
        return;
    }
    let estimated_passed = (outcome.sample_passed as f64 * population_size as f64
        / denominator as f64)
        .round() as usize;
    outcome.estimated_full_passed = estimated_passed.min(population_size);
    outcome.estimated_full_failed = population_size - outcome.estimated_full_passed;
    outcome.estimated_full_pass_rate = outcome.sample_pass_rate;
}

/// Overall score: weighted average of per-tier mean pass rates. Errored
/// rules are excluded from their tier's mean; a tier with no scorable rules
/// drops out and the remaining tier weights renormalize.
pub fn overall_score(outcomes: &[RuleOutcome]) -> f64 {
    let mut tier_rates: BTreeMap<Severity, Vec<f64>> = BTreeMap::new();
    for outcome in outcomes {
        if outcome.errored || outcome.sample_applicable == 0 {
            continue;
        }
        tier_rates
            .entry(outcome.severity)
            .or_default()
            .push(outcome.sample_pass_rate);
    }
    let mut weighted = 0.0;
    let mut weight_total = 0.0;
    for (severity, rates) in &tier_rates {
        let mean: f64 = rates.iter().sum::<f64>() / rates.len() as f64;
        weighted += severity.tier_weight() * mean;
        weight_total += severity.tier_weight();
    }
    if weight_total == 0.0 {
        return 0.0;
    }
    100.0 * weighted / weight_total
}

/// Pass-rate summary for one severity tier against its configured threshold.
#[derive(Debug, Clone, Serialize)]
pub struct TierSummary {
    pub severity: Severity,
    pub rule_count: usize,
    pub mean_pass_rate: f64,
    pub threshold: f64,
    pub meets_threshold: bool,
}

/// The terminal output of a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub method: SamplingMethod,
    pub seed: u64,
    pub population_size: usize,
    pub sample_size: usize,
    pub strata: Vec<SampleStratum>,
    pub outcomes: Vec<RuleOutcome>,
    pub tiers: Vec<TierSummary>,
    pub overall_score: f64,
}

impl ValidationReport {
    pub fn build(
        method: SamplingMethod,
        seed: u64,
        population_size: usize,
        sample_size: usize,
        strata: Vec<SampleStratum>,
        outcomes: Vec<RuleOutcome>,
        thresholds: &SeverityThresholds,
    ) -> Self {
        let overall = overall_score(&outcomes);
        let tiers = [
            (Severity::Critical, thresholds.critical),
            (Severity::Important, thresholds.important),
            (Severity::Optional, thresholds.optional),
        ]
        .into_iter()
        .filter_map(|(severity, threshold)| {
            let rates: Vec<f64> = outcomes
                .iter()
                .filter(|outcome| {
                    outcome.severity == severity
                        && !outcome.errored
                        && outcome.sample_applicable > 0
                })
                .map(|outcome| outcome.sample_pass_rate)
                .collect();
            if rates.is_empty() {
                return None;
            }
            let mean = 100.0 * rates.iter().sum::<f64>() / rates.len() as f64;
            Some(TierSummary {
                severity,
                rule_count: rates.len(),
                mean_pass_rate: mean,
                threshold,
                meets_threshold: mean >= threshold,
            })
        })
        .collect();

        Self {
            method,
            seed,
            population_size,
            sample_size,
            strata,
            outcomes,
            tiers,
            overall_score: overall,
        }
    }

    pub fn errored_rule_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.errored)
            .count()
    }
}
