//! CLI argument definitions for the reconciliation engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cadrec",
    version,
    about = "CAD/RMS record reconciliation engine",
    long_about = "Reconcile computer-aided dispatch (CAD) exports against records \
                  management system (RMS) exports.\n\n\
                  Maps vendor columns to a canonical schema, matches records by case \
                  number, applies audited corrections, scores record quality, and \
                  validates the result by stratified sampling."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full reconciliation pipeline and write its reports.
    Run(RunArgs),

    /// Run the pipeline, then validate the result by sampling.
    Validate(ValidateArgs),

    /// List the canonical fields of the active schema.
    Fields(FieldsArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the CAD export CSV (the primary source).
    #[arg(value_name = "CAD_CSV")]
    pub cad: PathBuf,

    /// Path to the RMS export CSV. Without it the run is CAD-only.
    #[arg(long = "rms", value_name = "RMS_CSV")]
    pub rms: Option<PathBuf>,

    /// Manual correction CSVs, applied in the order given.
    ///
    /// Each file needs a case-number column plus one column per corrected
    /// field. A file that fails to load is skipped and reported; the rest
    /// still apply.
    #[arg(long = "corrections", value_name = "CSV")]
    pub corrections: Vec<PathBuf>,

    /// Engine configuration TOML (defaults are compiled in).
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Output directory for reports (default: <CAD_CSV dir>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Map and match only; skip report writing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Sampling method override (stratified, systematic, random).
    #[arg(long = "method", value_enum)]
    pub method: Option<SamplingMethodArg>,

    /// Sampling seed override.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Target sample size override.
    #[arg(long = "sample-size")]
    pub sample_size: Option<usize>,
}

#[derive(Parser)]
pub struct FieldsArgs {
    /// Engine configuration TOML (defaults are compiled in).
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SamplingMethodArg {
    Stratified,
    Systematic,
    Random,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
