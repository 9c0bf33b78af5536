use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, info_span, warn};

use cadrec_config::{EngineConfig, SamplingMethod, default_config, load_config};
use cadrec_core::{collect_correction_sets, run_pipeline};
use cadrec_ingest::{load_correction_csv, load_source_csv};
use cadrec_model::{CorrectionSet, RunContext, SourceSystem};
use cadrec_report::{
    QualitySummary, write_audit_trail_csv, write_quality_summary_json, write_review_csv,
    write_validation_report_json,
};
use cadrec_validate::run_validation;

use crate::cli::{FieldsArgs, RunArgs, SamplingMethodArg, ValidateArgs};
use crate::summary::apply_table_style;
use crate::types::{RunResult, ValidateResult};

pub fn run_reconcile(args: &RunArgs) -> Result<RunResult> {
    let config = load_engine_config(args.config.as_deref())?;
    let (result, _) = execute_pipeline(args, &config)?;
    Ok(result)
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let mut config = load_engine_config(args.run.config.as_deref())?;
    if let Some(method) = args.method {
        config.sampling.method = match method {
            SamplingMethodArg::Stratified => SamplingMethod::Stratified,
            SamplingMethodArg::Systematic => SamplingMethod::Systematic,
            SamplingMethodArg::Random => SamplingMethod::Random,
        };
    }
    if let Some(seed) = args.seed {
        config.sampling.seed = seed;
    }
    if let Some(size) = args.sample_size {
        config.sampling.target_sample_size = size;
    }
    cadrec_config::validate(&config).context("validate config overrides")?;

    let (mut run, records) = execute_pipeline(&args.run, &config)?;

    let span = info_span!("validate_stage");
    let report = {
        let _guard = span.enter();
        let mut context = RunContext::new();
        let report = run_validation(&config, &records, &mut context);
        run.context.absorb(context);
        report
    };
    info!(
        sample = report.sample_size,
        score = report.overall_score,
        "validation complete"
    );

    let report_path = if args.run.dry_run {
        None
    } else {
        let path = run.output_dir.join("validation_report.json");
        write_validation_report_json(&path, &report)?;
        run.reports.push(path.clone());
        Some(path)
    };

    Ok(ValidateResult {
        run,
        report,
        report_path,
    })
}

pub fn run_fields(args: &FieldsArgs) -> Result<()> {
    let config = load_engine_config(args.config.as_deref())?;
    let mut table = Table::new();
    table.set_header(vec![
        "Field", "Group", "Required", "Aliases", "Transforms", "Validated",
    ]);
    apply_table_style(&mut table);
    for field in &config.registry.fields {
        let aliases = field
            .aliases
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            field.name.clone(),
            field.group.as_str().to_string(),
            if field.required { "yes" } else { "" }.to_string(),
            aliases,
            field.transformations.len().to_string(),
            if field.validation.is_some() { "yes" } else { "" }.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Map, match, correct, dedupe, and score; write run reports unless dry.
///
/// Returns the result alongside the reconciled records so `validate` can
/// sample them without a second pipeline pass.
fn execute_pipeline(
    args: &RunArgs,
    config: &EngineConfig,
) -> Result<(RunResult, Vec<cadrec_model::CanonicalRecord>)> {
    let start = Instant::now();
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.cad));

    let (primary, cad_stats) = load_source_csv(&args.cad, SourceSystem::Cad)
        .with_context(|| format!("load CAD export {}", args.cad.display()))?;
    let secondary = match &args.rms {
        Some(path) => {
            let (records, stats) = load_source_csv(path, SourceSystem::Rms)
                .with_context(|| format!("load RMS export {}", path.display()))?;
            Some((records, stats))
        }
        None => None,
    };

    let mut load_context = RunContext::new();
    let sets = load_correction_sets(args, config, &mut load_context);
    let sets_applied = sets.len();

    let progress = match &secondary {
        Some(_) => {
            let bar = ProgressBar::new(primary.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} matched")
                    .context("progress bar template")?,
            );
            Some(bar)
        }
        None => None,
    };
    let outcome = run_pipeline(
        config,
        &primary,
        secondary.as_ref().map(|(records, _)| records.as_slice()),
        &sets,
        |processed| {
            if let Some(bar) = &progress {
                bar.set_position(processed as u64);
            }
        },
    )?;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let mut context = outcome.context;
    context.absorb(load_context);

    let (matched, cad_only) = match &outcome.match_results {
        Some(results) => {
            let matched = results.iter().filter(|result| result.is_matched()).count();
            (matched, results.len() - matched)
        }
        None => (0, 0),
    };
    let mean_score = if outcome.scores.is_empty() {
        0.0
    } else {
        outcome.scores.iter().map(|score| score.total).sum::<f64>()
            / outcome.scores.len() as f64
    };

    let mut reports = Vec::new();
    if !args.dry_run {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("create output dir {}", output_dir.display()))?;

        let audit_path = output_dir.join("audit_trail.csv");
        write_audit_trail_csv(&audit_path, outcome.ledger.entries())?;
        reports.push(audit_path);

        let summary_path = output_dir.join("quality_summary.json");
        write_quality_summary_json(&summary_path, &QualitySummary::from_scores(&outcome.scores))?;
        reports.push(summary_path);

        if outcome.flags.flagged_count() > 0 {
            let review_path = output_dir.join("review.csv");
            write_review_csv(&review_path, &outcome.records, &outcome.flags)?;
            reports.push(review_path);
        }
    }

    info!(
        records = outcome.records.len(),
        matched,
        corrections = outcome.ledger.len(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );

    let result = RunResult {
        output_dir,
        cad_rows: cad_stats.rows,
        rms_rows: secondary.map(|(_, stats)| stats.rows),
        matched,
        cad_only,
        correction_entries: outcome.ledger.len(),
        correction_sets_applied: sets_applied,
        flagged_records: outcome.flags.flagged_count(),
        mean_score,
        context,
        reports,
    };
    Ok((result, outcome.records))
}

/// Load every `--corrections` file; failures become skipped sets on the
/// context, never aborts.
fn load_correction_sets(
    args: &RunArgs,
    config: &EngineConfig,
    context: &mut RunContext,
) -> Vec<CorrectionSet> {
    let case_key_column = &config.registry.case_key_field;
    let loaded = args
        .corrections
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let outcome = load_correction_csv(path, &name, "manual_fix", case_key_column)
                .map_err(|error| error.to_string());
            (name, outcome)
        })
        .collect();
    collect_correction_sets(loaded, context)
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let config =
                load_config(path).with_context(|| format!("load config {}", path.display()))?;
            info!(config = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => {
            let config = default_config().context("built-in configuration")?;
            Ok(config)
        }
    }
}

fn default_output_dir(cad_path: &Path) -> PathBuf {
    match cad_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("output"),
        Some(parent) => parent.join("output"),
        None => {
            warn!("CAD path has no parent directory, writing reports to ./output");
            PathBuf::from("output")
        }
    }
}
