//! CLI entry point for the listing analysis pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use listing_eda::{
    AggregateKind, AnalysisConfig, AnalysisConfigBuilder, ColumnSummary, EdaReport, Pipeline,
    ReportGenerator,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory analysis of short-term-rental listings",
    long_about = "Loads a listings CSV and reports data quality, IQR outliers, grouped \
                  aggregates, descriptive statistics, histograms \
                  and correlations.\n\n\
                  Without --config the 2019 NYC listings analysis is run.\n\n\
                  EXAMPLES:\n  \
                  # Full analysis of the NYC listings file\n  \
                  listing-eda -i AB_NYC_2019.csv\n\n  \
                  # First 1000 rows, machine-readable output\n  \
                  listing-eda -i AB_NYC_2019.csv --rows 1000 --json\n\n  \
                  # Custom analysis, report written to results/\n  \
                  listing-eda -i data.csv --config analysis.json -r -o results/"
)]
struct Args {
    /// Path to the delimited file to analyze
    #[arg(short, long)]
    input: String,

    /// Field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Only read the first N data rows
    #[arg(long)]
    rows: Option<usize>,

    /// JSON file describing the analysis (defaults to the NYC 2019 listings analysis)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Multiplier applied to the IQR for outlier fences
    #[arg(long)]
    iqr_multiplier: Option<f64>,

    /// Output directory for written reports
    #[arg(short, long)]
    output: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable tables
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let pipeline = build_pipeline(&args, config)?;

    match pipeline.run(&args.input) {
        Ok(report) => handle_output(&report, pipeline.config(), &args),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": &e }))?);
            }
            error!("Analysis failed: {}", e);
            Err(anyhow!("Analysis failed: {}", e))
        }
    }
}

/// Base configuration from `--config` or the listings preset, with CLI overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading analysis configuration from {}", path.display());
            AnalysisConfig::from_json_file(path)?
        }
        None => AnalysisConfig::listings_2019(),
    };

    let mut builder = AnalysisConfigBuilder::from_config(base);

    if let Some(delimiter) = args.delimiter {
        if !delimiter.is_ascii() {
            return Err(anyhow!("Delimiter must be a single ASCII character, got {:?}", delimiter));
        }
        builder = builder.delimiter(delimiter as u8);
    }
    if let Some(rows) = args.rows {
        builder = builder.row_limit(rows);
    }
    if let Some(k) = args.iqr_multiplier {
        builder = builder.iqr_multiplier(k);
    }
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }

    Ok(builder.build()?)
}

fn build_pipeline(args: &Args, config: AnalysisConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Handle pipeline output based on CLI flags.
///
/// - Default: print human-readable tables to stdout
/// - `--json`: print JSON to stdout only (no logs)
/// - `--emit-report`: also write the JSON report to a file
fn handle_output(report: &EdaReport, config: &AnalysisConfig, args: &Args) -> Result<()> {
    if args.emit_report {
        let generator = ReportGenerator::new(config.output_dir.clone());
        let report_path = generator.write_report_to_file(report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", ReportGenerator::to_json(report)?);
        return Ok(());
    }

    print_report(report);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print the report as text tables.
///
/// Uses `println!` for user-facing output so it is visible regardless of
/// log level.
fn print_report(report: &EdaReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("LISTING ANALYSIS");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Input: {} ({} rows x {} columns, {}ms)",
        report.input_file, report.shape.0, report.shape.1, report.duration_ms
    );
    println!();

    print_quality(report);
    print_outliers(report);
    print_aggregates(report);
    print_summaries(report);
    print_counts(report);
    print_group_summaries(report);
    print_distributions(report);

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the JSON report");
    println!("{}", "=".repeat(80));
}

fn section(title: &str) {
    println!("{}", title);
    println!("{}", "-".repeat(40));
}

fn print_quality(report: &EdaReport) {
    let quality = &report.quality;
    section("DATA QUALITY");
    println!("{:<32} {:>10} {:>10} {:>8}", "Column", "Type", "Missing", "Any");
    println!("{}", "-".repeat(64));
    for column in &quality.columns {
        println!(
            "{:<32} {:>10} {:>10} {:>8}",
            truncate_str(&column.column, 32),
            column.dtype,
            column.missing_count,
            column.has_missing
        );
    }
    println!();
    println!("  Duplicate rows: {}", quality.duplicate_rows);
    println!(
        "  Complete rows:  {} of {}",
        quality.complete_rows, quality.row_count
    );
    println!();
}

fn print_outliers(report: &EdaReport) {
    if report.outliers.is_empty() {
        return;
    }
    section("OUTLIERS (IQR)");
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Column", "Q1", "Q3", "Lower", "Upper", "Outliers"
    );
    println!("{}", "-".repeat(77));
    for outliers in &report.outliers {
        let fence = &outliers.fence;
        println!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>6} ({:.1}%)",
            truncate_str(&outliers.column, 20),
            fence.q1,
            fence.q3,
            fence.lower,
            fence.upper,
            outliers.outlier_count,
            outliers.outlier_percentage()
        );
    }
    println!();
}

fn print_aggregates(report: &EdaReport) {
    for aggregate in &report.aggregates {
        section(&format!(
            "{} BY {}",
            aggregate.kind.label().to_uppercase(),
            aggregate.group_columns.join(", ").to_uppercase()
        ));
        for cell in &aggregate.cells {
            let value = match aggregate.kind {
                AggregateKind::Count => format!("{:.0}", cell.value),
                AggregateKind::Mean { .. } => format!("{:.2}", cell.value),
                AggregateKind::FractionOfRowTotal => format!("{:.1}%", cell.value * 100.0),
            };
            println!("  {:<48} {:>12}", truncate_str(&cell.key.join(" / "), 48), value);
        }
        println!();
    }
}

fn print_summaries(report: &EdaReport) {
    if report.summaries.is_empty() {
        return;
    }
    section("DESCRIPTIVE STATISTICS");
    for summary in &report.summaries {
        print_summary_line(summary.column(), summary);
    }
    println!();
}

fn print_summary_line(label: &str, summary: &ColumnSummary) {
    match summary {
        ColumnSummary::Categorical {
            count,
            unique,
            top,
            freq,
            ..
        } => println!(
            "  {:<24} count={} unique={} top={} freq={}",
            truncate_str(label, 24),
            count,
            unique,
            top,
            freq
        ),
        ColumnSummary::Numeric {
            count,
            mean,
            std,
            min,
            p25,
            p50,
            p75,
            max,
            ..
        } => println!(
            "  {:<24} count={} mean={:.2} std={} min={:.2} 25%={:.2} 50%={:.2} 75%={:.2} max={:.2}",
            truncate_str(label, 24),
            count,
            mean,
            std.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "-".to_string()),
            min,
            p25,
            p50,
            p75,
            max
        ),
        ColumnSummary::InsufficientData { .. } => {
            println!("  {:<24} insufficient data", truncate_str(label, 24))
        }
    }
}

fn print_counts(report: &EdaReport) {
    for counts in report.value_counts.iter().chain(&report.top_categories) {
        section(&format!("VALUE COUNTS: {}", counts.column));
        for count in &counts.counts {
            println!("  {:<40} {:>8}", truncate_str(&count.value, 40), count.count);
        }
        println!();
    }
}

fn print_group_summaries(report: &EdaReport) {
    if let Some(trim) = &report.trim {
        println!(
            "Per-group summaries use rows with {} at or below its {:.0}th percentile ({} kept, {} removed)",
            trim.column,
            trim.quantile * 100.0,
            trim.rows_kept,
            trim.rows_removed
        );
        println!();
    }
    for grouped in &report.group_summaries {
        section(&format!(
            "{} BY {}",
            grouped.value_column.to_uppercase(),
            grouped.group_column.to_uppercase()
        ));
        for group in &grouped.groups {
            print_summary_line(&group.group, &group.summary);
        }
        println!();
    }
}

fn print_distributions(report: &EdaReport) {
    for histogram in &report.histograms {
        section(&format!("HISTOGRAM: {}", histogram.column));
        // Empty bins are left out to keep 100-bin histograms readable.
        for (index, count) in histogram.counts.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            if let Some((lower, upper)) = histogram.bin_range(index) {
                println!("  [{:>10.2}, {:>10.2}) {:>8}", lower, upper, count);
            }
        }
        println!("  Outside range: {}", histogram.outside);
        println!();
    }

    if report.correlations.is_empty() {
        return;
    }
    section("CORRELATION");
    for correlation in &report.correlations {
        let pearson = correlation
            .pearson
            .map(|r| format!("{:.3}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<40} r={} ({} pairs)",
            truncate_str(&format!("{} vs {}", correlation.x, correlation.y), 40),
            pearson,
            correlation.pairs
        );
    }
    println!();
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
