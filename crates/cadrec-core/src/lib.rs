//! Core reconciliation engine: matching, corrections, dedupe, scoring.

pub mod dedupe;
pub mod ledger;
pub mod matching;
pub mod pipeline;
pub mod score;
pub mod store;

pub use dedupe::{DuplicateFlags, detect};
pub use ledger::CorrectionLedger;
pub use matching::{SecondaryLookup, build_lookup, is_supplement_key, match_records};
pub use pipeline::{RunOutcome, collect_correction_sets, run_pipeline};
pub use score::{COMPONENTS, QualityScorer};
pub use store::RecordStore;
