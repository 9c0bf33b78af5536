//! Sampling-based validation: draw a stratified (or systematic/random)
//! sample, run severity-tiered rules against it, and extrapolate pass/fail
//! counts to the full population.

mod engine;
mod report;
mod run;
mod sample;

pub use engine::{MAX_FAILING_EXAMPLES, RuleEngine, RuleOutcome};
pub use report::{TierSummary, ValidationReport, extrapolate_outcome, overall_score};
pub use run::{EvaluatedRun, SampledRun, ValidationRun, run_validation};
pub use sample::{OTHER_STRATUM, Sample, SampleStratum, draw};
