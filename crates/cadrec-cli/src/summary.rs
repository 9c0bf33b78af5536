use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cadrec_model::RunContext;

use crate::types::{RunResult, ValidateResult};

pub fn print_run_summary(result: &RunResult) {
    println!("Output: {}", result.output_dir.display());
    for report in &result.reports {
        println!("Report: {}", report.display());
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    table.add_row(vec![Cell::new("CAD rows loaded"), Cell::new(result.cad_rows)]);
    match result.rms_rows {
        Some(rows) => {
            table.add_row(vec![Cell::new("RMS rows loaded"), Cell::new(rows)]);
            table.add_row(vec![
                Cell::new("Matched (CAD_RMS_MATCHED)"),
                Cell::new(result.matched)
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
            ]);
            table.add_row(vec![
                Cell::new("Unmatched (CAD_ONLY)"),
                Cell::new(result.cad_only),
            ]);
        }
        None => {
            table.add_row(vec![Cell::new("RMS rows loaded"), dim_cell("-")]);
        }
    }
    table.add_row(vec![
        Cell::new("Correction sets applied"),
        Cell::new(result.correction_sets_applied),
    ]);
    table.add_row(vec![
        Cell::new("Audit trail entries"),
        Cell::new(result.correction_entries),
    ]);
    table.add_row(vec![
        Cell::new("Records flagged for review"),
        count_cell(result.flagged_records, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Mean quality score"),
        Cell::new(format!("{:.1}", result.mean_score)),
    ]);
    table.add_row(vec![
        Cell::new("Recoverable errors"),
        count_cell(result.context.recoverable_error_count() as usize, Color::Red),
    ]);
    println!("{table}");
    print_diagnostics(&result.context);
}

pub fn print_validate_summary(result: &ValidateResult) {
    print_run_summary(&result.run);
    let report = &result.report;
    println!();
    println!(
        "Validation: {} sample of {} from {} records (seed {})",
        report.method.as_str(),
        report.sample_size,
        report.population_size,
        report.seed
    );
    if let Some(path) = &result.report_path {
        println!("Report: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Tier"),
        header_cell("Rules"),
        header_cell("Pass rate"),
        header_cell("Threshold"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for tier in &report.tiers {
        let status = if tier.meets_threshold {
            Cell::new("PASS")
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new("FAIL")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            Cell::new(tier.severity.as_str()),
            Cell::new(tier.rule_count),
            Cell::new(percent_text(tier.mean_pass_rate)),
            Cell::new(percent_text(tier.threshold)),
            status,
        ]);
    }
    println!("{table}");
    println!("Overall score: {:.1}", report.overall_score);

    let failing: Vec<_> = report
        .outcomes
        .iter()
        .filter(|outcome| outcome.sample_failed > 0 || outcome.errored)
        .collect();
    if failing.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Severity"),
        header_cell("Failed"),
        header_cell("Est. full failed"),
        header_cell("Fix"),
        header_cell("Examples"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for outcome in failing {
        let failed_cell = if outcome.errored {
            Cell::new(format!("{} (errored)", outcome.sample_failed)).fg(Color::Red)
        } else {
            Cell::new(outcome.sample_failed).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&outcome.rule_id).add_attribute(Attribute::Bold),
            Cell::new(outcome.severity.as_str()),
            failed_cell,
            Cell::new(outcome.estimated_full_failed),
            Cell::new(outcome.fix_suggestion.as_deref().unwrap_or("-")),
            example_cell(&outcome.failing_examples),
        ]);
    }
    println!();
    println!("Failing rules:");
    println!("{table}");
}

fn print_diagnostics(context: &RunContext) {
    for (set, reason) in &context.correction_sets_skipped {
        eprintln!("skipped correction set '{set}': {reason}");
    }
    for (rule, reason) in &context.rule_errors {
        eprintln!("rule {rule} errored: {reason}");
    }
    for warning in &context.warnings {
        eprintln!("warning: {warning}");
    }
    if !context.validation_failures.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Field"),
            header_cell("Validation failures"),
            header_cell("Fallback accepted"),
        ]);
        apply_summary_table_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Right);
        align_column(&mut table, 2, CellAlignment::Right);
        for (field, failures) in &context.validation_failures {
            let fallbacks = context.fallback_validations.get(field).copied().unwrap_or(0);
            table.add_row(vec![
                Cell::new(field),
                count_cell(*failures as usize, Color::Red),
                Cell::new(fallbacks),
            ]);
        }
        println!();
        println!("Field validation:");
        println!("{table}");
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

/// Tier pass rates and thresholds arrive already scaled to percent.
fn percent_text(value: f64) -> String {
    format!("{value:.1}%")
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn example_cell(examples: &[String]) -> Cell {
    if examples.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(examples.join(", "))
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
