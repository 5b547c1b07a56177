//! Configuration types for the analysis pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup. Configurations are also
//! serde-deserializable so a whole analysis can be described in a JSON file.

use crate::error::AnalysisError;
use crate::types::{AggregateKind, GroupSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Columns the 2019 NYC listings file must provide.
pub const LISTING_COLUMNS: [&str; 5] = [
    "neighbourhood_group",
    "neighbourhood",
    "room_type",
    "number_of_reviews",
    "price",
];

/// Options controlling how the input file is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Field delimiter byte.
    /// Default: b','
    pub delimiter: u8,

    /// Only read the first K data rows.
    /// Default: None (read everything)
    pub row_limit: Option<usize>,

    /// Columns that must exist in the header.
    /// Default: empty
    pub required_columns: Vec<String>,

    /// Columns that must hold numbers; a value that does not parse fails the load.
    /// Default: empty
    pub numeric_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            row_limit: None,
            required_columns: Vec::new(),
            numeric_columns: Vec::new(),
        }
    }
}

/// A per-group numeric summary request (group column, value column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummarySpec {
    pub group_column: String,
    pub value_column: String,
}

/// A histogram request over a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSpec {
    pub column: String,
    pub bins: usize,
    /// `[lower, upper]`; values outside it are counted apart from the bins.
    #[serde(default)]
    pub range: Option<(f64, f64)>,
}

/// A correlation request between two numeric columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSpec {
    pub x: String,
    pub y: String,
}

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API, or [`AnalysisConfig::listings_2019()`] for the
/// preset matching the NYC listings analysis.
///
/// # Example
///
/// ```rust,ignore
/// use listing_eda::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .outlier_columns(["price"])
///     .summary_columns(["room_type", "price"])
///     .iqr_multiplier(1.5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// How the input file is read.
    pub load: LoadOptions,

    /// Numeric columns to run IQR outlier detection on.
    pub outlier_columns: Vec<String>,

    /// Multiplier applied to the IQR when building fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Grouped aggregates to compute.
    pub aggregates: Vec<GroupSpec>,

    /// Columns for the descriptive-statistics table, in output order.
    pub summary_columns: Vec<String>,

    /// Categorical columns to compute value counts for.
    pub count_columns: Vec<String>,

    /// Column for the top-N breakdown with an "Other" bucket.
    /// Default: None
    pub top_n_column: Option<String>,

    /// Number of categories kept by the top-N breakdown.
    /// Default: 10
    pub top_n: usize,

    /// Per-group numeric summaries to compute.
    pub group_summaries: Vec<GroupSummarySpec>,

    /// Histograms to compute.
    pub histograms: Vec<HistogramSpec>,

    /// Column pairs to correlate.
    pub correlations: Vec<CorrelationSpec>,

    /// Numeric column trimmed at `trim_quantile` before per-group summaries.
    /// Default: None (summaries use the full table)
    pub trim_column: Option<String>,

    /// Quantile used by the trim (0.0 - 1.0).
    /// Default: 0.95
    pub trim_quantile: f64,

    /// Output directory for written reports.
    /// Default: "outputs"
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            outlier_columns: Vec::new(),
            iqr_multiplier: 1.5,
            aggregates: Vec::new(),
            summary_columns: Vec::new(),
            count_columns: Vec::new(),
            top_n_column: None,
            top_n: 10,
            group_summaries: Vec::new(),
            histograms: Vec::new(),
            correlations: Vec::new(),
            trim_column: None,
            trim_quantile: 0.95,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// The analysis of the 2019 NYC listings dataset.
    pub fn listings_2019() -> Self {
        let owned = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        Self {
            load: LoadOptions {
                required_columns: owned(&LISTING_COLUMNS),
                numeric_columns: owned(&["number_of_reviews", "price"]),
                ..LoadOptions::default()
            },
            outlier_columns: owned(&["price", "number_of_reviews"]),
            aggregates: vec![
                GroupSpec::new(["neighbourhood_group"], AggregateKind::Count),
                GroupSpec::new(
                    ["neighbourhood_group", "room_type"],
                    AggregateKind::mean("price"),
                ),
                GroupSpec::new(
                    ["neighbourhood_group", "room_type"],
                    AggregateKind::FractionOfRowTotal,
                ),
            ],
            summary_columns: owned(&LISTING_COLUMNS),
            count_columns: owned(&["neighbourhood_group", "room_type"]),
            top_n_column: Some("neighbourhood".to_string()),
            group_summaries: vec![
                GroupSummarySpec {
                    group_column: "neighbourhood_group".to_string(),
                    value_column: "price".to_string(),
                },
                GroupSummarySpec {
                    group_column: "room_type".to_string(),
                    value_column: "price".to_string(),
                },
                GroupSummarySpec {
                    group_column: "room_type".to_string(),
                    value_column: "number_of_reviews".to_string(),
                },
            ],
            histograms: vec![
                HistogramSpec {
                    column: "number_of_reviews".to_string(),
                    bins: 50,
                    range: Some((0.0, 300.0)),
                },
                HistogramSpec {
                    column: "price".to_string(),
                    bins: 100,
                    range: Some((0.0, 1500.0)),
                },
            ],
            correlations: vec![CorrelationSpec {
                x: "number_of_reviews".to_string(),
                y: "price".to_string(),
            }],
            trim_column: Some("price".to_string()),
            ..Self::default()
        }
    }

    /// Read and validate a JSON configuration file.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if matches!(self.load.delimiter, b'"' | b'\n' | b'\r') {
            return Err(ConfigValidationError::InvalidDelimiter(
                self.load.delimiter as char,
            ));
        }

        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        if !(0.0..=1.0).contains(&self.trim_quantile) {
            return Err(ConfigValidationError::InvalidQuantile {
                field: "trim_quantile".to_string(),
                value: self.trim_quantile,
            });
        }

        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }

        for spec in &self.histograms {
            if spec.bins == 0 {
                return Err(ConfigValidationError::InvalidBins(spec.column.clone()));
            }
            if let Some((lower, upper)) = spec.range
                && !(lower.is_finite() && upper.is_finite() && lower < upper)
            {
                return Err(ConfigValidationError::InvalidRange {
                    column: spec.column.clone(),
                    lower,
                    upper,
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid delimiter {0:?} (quote and newline characters are reserved)")]
    InvalidDelimiter(char),

    #[error("Invalid IQR multiplier: {0} (must be a positive number)")]
    InvalidIqrMultiplier(f64),

    #[error("Invalid quantile for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidQuantile { field: String, value: f64 },

    #[error("Invalid top-N: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Histogram of '{0}' needs at least one bin")]
    InvalidBins(String),

    #[error("Histogram range of '{column}' is empty: [{lower}, {upper}]")]
    InvalidRange {
        column: String,
        lower: f64,
        upper: f64,
    },
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    base: Option<AnalysisConfig>,
    delimiter: Option<u8>,
    row_limit: Option<usize>,
    required_columns: Option<Vec<String>>,
    numeric_columns: Option<Vec<String>>,
    outlier_columns: Option<Vec<String>>,
    iqr_multiplier: Option<f64>,
    aggregates: Vec<GroupSpec>,
    summary_columns: Option<Vec<String>>,
    count_columns: Option<Vec<String>>,
    top_n_column: Option<String>,
    top_n: Option<usize>,
    group_summaries: Vec<GroupSummarySpec>,
    histograms: Vec<HistogramSpec>,
    correlations: Vec<CorrelationSpec>,
    trim_column: Option<String>,
    trim_quantile: Option<f64>,
    output_dir: Option<PathBuf>,
}

fn owned_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

impl AnalysisConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    ///
    /// Values set on the builder override the base.
    pub fn from_config(config: AnalysisConfig) -> Self {
        Self {
            base: Some(config),
            ..Self::default()
        }
    }

    /// Set the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Only read the first `rows` data rows.
    pub fn row_limit(mut self, rows: usize) -> Self {
        self.row_limit = Some(rows);
        self
    }

    /// Columns the header must contain.
    pub fn required_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = Some(owned_names(names));
        self
    }

    /// Columns whose values must all parse as numbers.
    pub fn numeric_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = Some(owned_names(names));
        self
    }

    pub fn outlier_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(owned_names(names));
        self
    }

    /// Set the IQR multiplier used for outlier fences.
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Add a grouped aggregate.
    pub fn aggregate(mut self, spec: GroupSpec) -> Self {
        self.aggregates.push(spec);
        self
    }

    pub fn summary_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summary_columns = Some(owned_names(names));
        self
    }

    pub fn count_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.count_columns = Some(owned_names(names));
        self
    }

    /// Request a top-N breakdown of `column`.
    pub fn top_n(mut self, column: impl Into<String>, n: usize) -> Self {
        self.top_n_column = Some(column.into());
        self.top_n = Some(n);
        self
    }

    /// Add a per-group numeric summary.
    pub fn group_summary(
        mut self,
        group_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        self.group_summaries.push(GroupSummarySpec {
            group_column: group_column.into(),
            value_column: value_column.into(),
        });
        self
    }

    /// Add a histogram of `column`, optionally limited to `range`.
    pub fn histogram(
        mut self,
        column: impl Into<String>,
        bins: usize,
        range: Option<(f64, f64)>,
    ) -> Self {
        self.histograms.push(HistogramSpec {
            column: column.into(),
            bins,
            range,
        });
        self
    }

    pub fn correlation(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.correlations.push(CorrelationSpec {
            x: x.into(),
            y: y.into(),
        });
        self
    }

    /// Trim `column` at `quantile` before computing per-group summaries.
    pub fn trim(mut self, column: impl Into<String>, quantile: f64) -> Self {
        self.trim_column = Some(column.into());
        self.trim_quantile = Some(quantile);
        self
    }

    /// Set the output directory for written reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let mut aggregates = base.aggregates;
        aggregates.extend(self.aggregates);
        let mut group_summaries = base.group_summaries;
        group_summaries.extend(self.group_summaries);
        let mut histograms = base.histograms;
        histograms.extend(self.histograms);
        let mut correlations = base.correlations;
        correlations.extend(self.correlations);

        let config = AnalysisConfig {
            load: LoadOptions {
                delimiter: self.delimiter.unwrap_or(base.load.delimiter),
                row_limit: self.row_limit.or(base.load.row_limit),
                required_columns: self
                    .required_columns
                    .unwrap_or(base.load.required_columns),
                numeric_columns: self.numeric_columns.unwrap_or(base.load.numeric_columns),
            },
            outlier_columns: self.outlier_columns.unwrap_or(base.outlier_columns),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(base.iqr_multiplier),
            aggregates,
            summary_columns: self.summary_columns.unwrap_or(base.summary_columns),
            count_columns: self.count_columns.unwrap_or(base.count_columns),
            top_n_column: self.top_n_column.or(base.top_n_column),
            top_n: self.top_n.unwrap_or(base.top_n),
            group_summaries,
            histograms,
            correlations,
            trim_column: self.trim_column.or(base.trim_column),
            trim_quantile: self.trim_quantile.unwrap_or(base.trim_quantile),
            output_dir: self.output_dir.unwrap_or(base.output_dir),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.load.delimiter, b',');
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.trim_quantile, 0.95);
        assert_eq!(config.top_n, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listings_preset() {
        let config = AnalysisConfig::listings_2019();
        assert_eq!(config.summary_columns, LISTING_COLUMNS.to_vec());
        assert_eq!(config.load.required_columns.len(), 5);
        assert_eq!(config.outlier_columns, vec!["price", "number_of_reviews"]);
        assert_eq!(config.aggregates.len(), 3);
        assert_eq!(config.top_n_column.as_deref(), Some("neighbourhood"));
        assert_eq!(config.histograms.len(), 2);
        assert_eq!(config.histograms[1].bins, 100);
        assert_eq!(config.histograms[1].range, Some((0.0, 1500.0)));
        assert_eq!(config.correlations[0].y, "price");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .delimiter(b';')
            .row_limit(100)
            .outlier_columns(["price"])
            .iqr_multiplier(3.0)
            .aggregate(GroupSpec::new(["room_type"], AggregateKind::Count))
            .top_n("neighbourhood", 5)
            .build()
            .unwrap();

        assert_eq!(config.load.delimiter, b';');
        assert_eq!(config.load.row_limit, Some(100));
        assert_eq!(config.outlier_columns, vec!["price"]);
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.aggregates.len(), 1);
        assert_eq!(config.top_n, 5);
    }

    #[test]
    fn test_builder_overrides_base() {
        let config = AnalysisConfigBuilder::from_config(AnalysisConfig::listings_2019())
            .row_limit(50)
            .build()
            .unwrap();

        assert_eq!(config.load.row_limit, Some(50));
        assert_eq!(config.summary_columns.len(), 5);
        assert_eq!(config.aggregates.len(), 3);
    }

    #[test]
    fn test_validation_invalid_delimiter() {
        let result = AnalysisConfig::builder().delimiter(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDelimiter('"')
        ));
    }

    #[test]
    fn test_validation_invalid_multiplier() {
        let result = AnalysisConfig::builder().iqr_multiplier(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidIqrMultiplier(_)
        ));
    }

    #[test]
    fn test_validation_invalid_quantile() {
        let result = AnalysisConfig::builder().trim("price", 1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidQuantile { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_top_n() {
        let result = AnalysisConfig::builder().top_n("neighbourhood", 0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTopN(0)
        ));
    }

    #[test]
    fn test_validation_invalid_histogram() {
        let result = AnalysisConfig::builder()
            .histogram("price", 0, None)
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidBins(c) if c == "price"
        ));

        let result = AnalysisConfig::builder()
            .histogram("price", 100, Some((1500.0, 0.0)))
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidRange { .. }
        ));
    }

    #[test]
    fn test_histogram_spec_from_json() {
        let json = r#"{
            "histograms": [{ "column": "price", "bins": 20, "range": [0.0, 500.0] }],
            "correlations": [{ "x": "number_of_reviews", "y": "price" }]
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.histograms[0].range, Some((0.0, 500.0)));
        assert_eq!(config.correlations.len(), 1);
    }

    #[test]
    fn test_config_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "listing_eda_config_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "outlier_columns": ["price"], "top_n": 3 }"#).unwrap();
        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.outlier_columns, vec!["price"]);
        assert_eq!(config.top_n, 3);

        std::fs::write(&path, r#"{ "iqr_multiplier": -2.0 }"#).unwrap();
        let err = AnalysisConfig::from_json_file(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "load": { "delimiter": 59, "row_limit": 20 },
            "outlier_columns": ["price"],
            "aggregates": [
                { "by": ["room_type"], "kind": { "mean": { "target": "price" } } }
            ],
            "summary_columns": ["room_type", "price"]
        }"#;

        let config: AnalysisConfig = serde_json::from_str(json).expect("should deserialize");

        assert_eq!(config.load.delimiter, b';');
        assert_eq!(config.load.row_limit, Some(20));
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(
            config.aggregates[0].kind,
            AggregateKind::Mean {
                target: "price".to_string()
            }
        );
        assert_eq!(config.summary_columns, vec!["room_type", "price"]);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AnalysisConfig::listings_2019();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.aggregates, deserialized.aggregates);
        assert_eq!(config.load, deserialized.load);
    }
}
