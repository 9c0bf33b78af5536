//! The validation run state machine.
//!
//! The stages are encoded as types: `ValidationRun` (not started) →
//! [`SampledRun`] → [`EvaluatedRun`] → [`ValidationReport`] (terminal). Each
//! transition consumes the previous stage, so stages cannot run out of order
//! or twice.

use cadrec_config::EngineConfig;
use cadrec_map::AddressClassifier;
use cadrec_model::{CanonicalRecord, RunContext};

use crate::engine::{RuleEngine, RuleOutcome};
use crate::report::{ValidationReport, extrapolate_outcome};
use crate::sample::{self, Sample};

pub struct ValidationRun<'a> {
    config: &'a EngineConfig,
    population: &'a [CanonicalRecord],
}

pub struct SampledRun<'a> {
    config: &'a EngineConfig,
    population: &'a [CanonicalRecord],
    sample: Sample,
}

pub struct EvaluatedRun<'a> {
    config: &'a EngineConfig,
    sample: Sample,
    outcomes: Vec<RuleOutcome>,
    _population: &'a [CanonicalRecord],
}

impl<'a> ValidationRun<'a> {
    pub fn new(config: &'a EngineConfig, population: &'a [CanonicalRecord]) -> Self {
        Self { config, population }
    }

    /// Draw the sample per the configured method and seed.
    pub fn sample(self) -> SampledRun<'a> {
        let sample = sample::draw(self.population, &self.config.sampling);
        SampledRun {
            config: self.config,
            population: self.population,
            sample,
        }
    }
}

impl<'a> SampledRun<'a> {
    pub fn sample_size(&self) -> usize {
        self.sample.len()
    }

    /// Run every configured rule against the sample.
    pub fn evaluate(self, context: &mut RunContext) -> EvaluatedRun<'a> {
        let classifier =
            AddressClassifier::new(&self.config.registry.generic_location_terms);
        let engine = RuleEngine::new(
            &classifier,
            &self.config.registry.valid_dispositions,
            &self.config.rules,
        );
        let outcomes = engine.evaluate(
            self.population,
            &self.sample.indices,
            &self.config.rules,
            context,
        );
        EvaluatedRun {
            config: self.config,
            sample: self.sample,
            outcomes,
            _population: self.population,
        }
    }
}

impl<'a> EvaluatedRun<'a> {
    /// Scale sample counts to the population and assemble the terminal
    /// report.
    pub fn extrapolate(mut self) -> ValidationReport {
        for outcome in &mut self.outcomes {
            extrapolate_outcome(outcome, self.sample.population_size);
        }
        ValidationReport::build(
            self.sample.method,
            self.sample.seed,
            self.sample.population_size,
            self.sample.len(),
            self.sample.strata,
            self.outcomes,
            &self.config.sampling.thresholds,
        )
    }
}

/// Convenience wrapper for the full state machine.
pub fn run_validation(
    config: &EngineConfig,
    population: &[CanonicalRecord],
    context: &mut RunContext,
) -> ValidationReport {
    ValidationRun::new(config, population)
        .sample()
        .evaluate(context)
        .extrapolate()
}
