use crate::error::Result;
use crate::types::{
    ColumnSummary, Correlation, GroupedAggregate, GroupedSummaries, Histogram, OutlierSummary,
    QualityReport, ValueCounts,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything one pipeline run computed.
///
/// Used both for JSON output (`--json`) and file output (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaReport {
    // Metadata
    /// Local timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Rows and columns of the loaded table
    pub shape: (usize, usize),
    /// Total execution time in milliseconds
    pub duration_ms: u64,

    pub quality: QualityReport,
    pub outliers: Vec<OutlierSummary>,
    pub aggregates: Vec<GroupedAggregate>,
    pub summaries: Vec<ColumnSummary>,
    pub value_counts: Vec<ValueCounts>,
    /// Top-N breakdown with an "Other" bucket
    pub top_categories: Option<ValueCounts>,
    /// Per-group summaries, computed on the trimmed table when a trim is set
    pub group_summaries: Vec<GroupedSummaries>,
    pub trim: Option<TrimSummary>,
    pub histograms: Vec<Histogram>,
    pub correlations: Vec<Correlation>,

    /// Non-fatal conditions, such as outlier columns without values
    pub warnings: Vec<String>,
}

impl EdaReport {
    /// Empty report for `input_file`, stamped with the current local time.
    pub fn new(input_file: impl Into<String>, shape: (usize, usize), quality: QualityReport) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.into(),
            shape,
            duration_ms: 0,
            quality,
            outliers: Vec::new(),
            aggregates: Vec::new(),
            summaries: Vec::new(),
            value_counts: Vec::new(),
            top_categories: None,
            group_summaries: Vec::new(),
            trim: None,
            histograms: Vec::new(),
            correlations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn outlier(&self, column: &str) -> Option<&OutlierSummary> {
        self.outliers.iter().find(|o| o.column == column)
    }

    pub fn histogram(&self, column: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|h| h.column == column)
    }
}

/// Outcome of trimming a column at a percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimSummary {
    pub column: String,
    pub quantile: f64,
    pub rows_kept: usize,
    pub rows_removed: usize,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Writes reports to the output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Pretty-printed JSON of the report.
    pub fn to_json(report: &EdaReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Write the report as `<base_name>_report.json` in the output directory.
    pub fn write_report_to_file(&self, report: &EdaReport, report_base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(Self::to_json(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
