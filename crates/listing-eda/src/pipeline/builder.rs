//! Main analysis pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! running every analysis step over one input file.

use crate::aggregate::Aggregator;
use crate::config::{AnalysisConfig, ConfigValidationError};
use crate::distribution::{correlation, histogram};
use crate::error::{AnalysisError, Result, ResultExt};
use crate::loader::load_csv;
use crate::outliers::{OutlierDetector, trim_above_quantile};
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::profiler::Summarizer;
use crate::quality::QualityChecker;
use crate::reporting::{EdaReport, TrimSummary};
use crate::table::Table;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use listing_eda::{AnalysisConfig, Pipeline};
///
/// let report = Pipeline::builder()
///     .config(AnalysisConfig::listings_2019())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run("AB_NYC_2019.csv")?;
/// ```
pub struct Pipeline {
    config: AnalysisConfig,
    detector: OutlierDetector,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load `path` and run every configured analysis on it.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<EdaReport> {
        let path = path.as_ref();
        let start_time = Instant::now();

        let outcome = self.load(path).and_then(|table| {
            self.analyze_internal(&table, &path.display().to_string(), start_time)
        });
        self.finish(outcome)
    }

    /// Run every configured analysis on an already loaded table.
    pub fn analyze(&self, table: &Table, input_file: &str) -> Result<EdaReport> {
        let outcome = self.analyze_internal(table, input_file, Instant::now());
        self.finish(outcome)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn finish(&self, outcome: Result<EdaReport>) -> Result<EdaReport> {
        match outcome {
            Ok(report) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(report)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn load(&self, path: &Path) -> Result<Table> {
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            0.0,
            format!("Loading {}...", path.display()),
        ));
        info!("Step 1: Loading {}", path.display());

        load_csv(path, &self.config.load).context(format!("Failed to load {}", path.display()))
    }

    fn analyze_internal(
        &self,
        table: &Table,
        input_file: &str,
        start_time: Instant,
    ) -> Result<EdaReport> {
        // Step 2: Quality check
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::QualityCheck,
            0.0,
            "Checking data quality...",
        ));
        info!("Step 2: Checking data quality...");
        let quality = QualityChecker::check(table)?;
        if quality.duplicate_rows > 0 {
            info!("Found {} duplicate rows", quality.duplicate_rows);
        }

        let mut report = EdaReport::new(input_file, table.shape(), quality);

        // Step 3: Outlier fences
        info!("Step 3: Detecting outliers...");
        let total = self.config.outlier_columns.len();
        for (i, column) in self.config.outlier_columns.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::OutlierDetection,
                format!("Column: {}", column),
                i,
                total,
                format!("Detecting outliers in {}", column),
            ));
            match self.detector.detect(table, column) {
                Ok(outliers) => {
                    debug!(
                        "Column '{}': {} outliers",
                        column,
                        outliers.outlier_count()
                    );
                    report.outliers.push(outliers.summary());
                }
                Err(e) if e.is_insufficient_data() => {
                    warn!("Skipping outlier detection for '{}': no values", column);
                    report
                        .warnings
                        .push(format!("Column '{}' has no values for outlier detection", column));
                }
                Err(e) => return Err(e.with_context(format!("Outlier detection on '{}'", column))),
            }
        }

        // Step 4: Grouped aggregates
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Aggregation,
            0.0,
            "Aggregating groups...",
        ));
        info!("Step 4: Aggregating {} groupings...", self.config.aggregates.len());
        for spec in &self.config.aggregates {
            report.aggregates.push(Aggregator::aggregate(table, spec)?);
        }

        // Step 5: Summaries
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Summarization,
            0.0,
            "Summarizing columns...",
        ));
        info!("Step 5: Summarizing columns...");
        report.summaries = Summarizer::summarize(table, &self.config.summary_columns)?;

        for column in &self.config.count_columns {
            report.value_counts.push(Aggregator::value_counts(table, column)?);
        }

        if let Some(column) = &self.config.top_n_column {
            report.top_categories = Some(Aggregator::top_n_with_other(
                table,
                column,
                self.config.top_n,
            )?);
        }

        for spec in &self.config.histograms {
            match histogram(table, &spec.column, spec.bins, spec.range) {
                Ok(result) => report.histograms.push(result),
                Err(e) if e.is_insufficient_data() => {
                    warn!("Skipping histogram of '{}': no values", spec.column);
                    report
                        .warnings
                        .push(format!("Column '{}' has no values for a histogram", spec.column));
                }
                Err(e) => return Err(e.with_context(format!("Histogram of '{}'", spec.column))),
            }
        }

        for spec in &self.config.correlations {
            match correlation(table, &spec.x, &spec.y) {
                Ok(result) => report.correlations.push(result),
                Err(e) if e.is_insufficient_data() => {
                    warn!("Skipping correlation of '{}' and '{}': no pairs", spec.x, spec.y);
                    report.warnings.push(format!(
                        "Columns '{}' and '{}' have no value pairs to correlate",
                        spec.x, spec.y
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        let grouped_source = self.trimmed_table(table, &mut report)?;
        for spec in &self.config.group_summaries {
            report.group_summaries.push(Summarizer::summarize_by_group(
                &grouped_source,
                &spec.group_column,
                &spec.value_column,
            )?);
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Analysis completed in {}ms", report.duration_ms);
        Ok(report)
    }

    /// The table per-group summaries run on: trimmed when a trim column is set.
    fn trimmed_table<'a>(&self, table: &'a Table, report: &mut EdaReport) -> Result<Cow<'a, Table>> {
        let Some(column) = &self.config.trim_column else {
            return Ok(Cow::Borrowed(table));
        };

        match trim_above_quantile(table, column, self.config.trim_quantile) {
            Ok(trimmed) => {
                report.trim = Some(TrimSummary {
                    column: column.clone(),
                    quantile: self.config.trim_quantile,
                    rows_kept: trimmed.height(),
                    rows_removed: table.height() - trimmed.height(),
                });
                Ok(Cow::Owned(trimmed))
            }
            Err(AnalysisError::InsufficientData(_)) => {
                warn!("Skipping trim of '{}': no values", column);
                report
                    .warnings
                    .push(format!("Column '{}' has no values to trim", column));
                Ok(Cow::Borrowed(table))
            }
            Err(e) => Err(e),
        }
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let detector = OutlierDetector::with_multiplier(config.iqr_multiplier)
            .map_err(|_| ConfigValidationError::InvalidIqrMultiplier(config.iqr_multiplier))?;

        Ok(Pipeline {
            config,
            detector,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AggregateKind, ColumnSummary, GroupSpec};
    use polars::prelude::*;
    use std::sync::Mutex;

    fn listings() -> Table {
        Table::new(
            df![
                "neighbourhood_group" => ["Brooklyn", "Manhattan", "Brooklyn", "Manhattan", "Queens"],
                "neighbourhood" => ["Kensington", "Midtown", "Williamsburg", "Harlem", "Astoria"],
                "room_type" => ["Private room", "Entire home/apt", "Entire home/apt", "Private room", "Private room"],
                "number_of_reviews" => [9i64, 45, 0, 270, 9],
                "price" => [149i64, 225, 150, 89, 10000],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_default_build() {
        let pipeline = Pipeline::builder().build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = AnalysisConfig {
            iqr_multiplier: -1.0,
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_analyze_with_listings_preset() {
        let pipeline = Pipeline::builder()
            .config(AnalysisConfig::listings_2019())
            .build()
            .unwrap();
        let report = pipeline.analyze(&listings(), "memory").unwrap();

        assert_eq!(report.shape, (5, 5));
        assert_eq!(report.outliers.len(), 2);
        let price = report.outlier("price").unwrap();
        assert_eq!(price.outlier_count, 1);
        assert_eq!(report.aggregates.len(), 3);
        assert_eq!(report.summaries.len(), 5);
        assert_eq!(report.value_counts.len(), 2);
        assert_eq!(report.top_categories.as_ref().unwrap().counts.len(), 5);
        assert_eq!(report.group_summaries.len(), 3);
        assert_eq!(report.histogram("price").unwrap().outside, 1);
        assert_eq!(report.histogram("number_of_reviews").unwrap().total(), 5);
        assert_eq!(report.correlations[0].pairs, 5);

        // p95 of price trims the 10000 listing before per-group summaries.
        let trim = report.trim.as_ref().unwrap();
        assert_eq!(trim.rows_kept, 4);
        assert_eq!(trim.rows_removed, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_outlier_column_becomes_warning() {
        let table = Table::new(
            df![
                "room_type" => ["A", "B"],
                "price" => [None::<i64>, None],
            ]
            .unwrap(),
        );
        let config = AnalysisConfig::builder()
            .outlier_columns(["price"])
            .summary_columns(["room_type", "price"])
            .build()
            .unwrap();
        let report = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .analyze(&table, "memory")
            .unwrap();

        assert!(report.outliers.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.summaries[1],
            ColumnSummary::InsufficientData { .. }
        ));
    }

    #[test]
    fn test_empty_distribution_columns_become_warnings() {
        let table = Table::new(
            df![
                "number_of_reviews" => [Some(3i64), None],
                "price" => [None::<i64>, Some(80)],
            ]
            .unwrap(),
        );
        let config = AnalysisConfig::builder()
            .histogram("number_of_reviews", 10, None)
            .histogram("price", 10, Some((0.0, 100.0)))
            .correlation("number_of_reviews", "price")
            .build()
            .unwrap();
        let report = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .analyze(&table, "memory")
            .unwrap();

        assert_eq!(report.histograms.len(), 2);
        assert!(report.correlations.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_missing_column_fails_run() {
        let config = AnalysisConfig::builder()
            .aggregate(GroupSpec::new(["borough"], AggregateKind::Count))
            .build()
            .unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .analyze(&listings(), "memory");
        assert!(matches!(result, Err(AnalysisError::ColumnNotFound(_))));
    }

    #[test]
    fn test_progress_stages_reported_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();

        let config = AnalysisConfig::builder()
            .outlier_columns(["price"])
            .build()
            .unwrap();
        Pipeline::builder()
            .config(config)
            .on_progress(move |update| seen.lock().unwrap().push(update.stage))
            .build()
            .unwrap()
            .analyze(&listings(), "memory")
            .unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(
            *stages,
            vec![
                AnalysisStage::QualityCheck,
                AnalysisStage::OutlierDetection,
                AnalysisStage::Aggregation,
                AnalysisStage::Summarization,
                AnalysisStage::Complete,
            ]
        );
    }
}
