//! Listing Exploratory Analysis Library
//!
//! Descriptive statistics and outlier detection over short-term-rental
//! listings, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Loading**: delimited files into an in-memory [`Table`], with structural
//!   checks and strict numeric coercion
//! - **Quality**: missing values, duplicate rows and column types
//! - **Outliers**: interquartile-range fences per numeric column
//! - **Aggregation**: counts, means and row-group shares by one or two columns
//! - **Summaries**: per-column describe tables and per-group numeric summaries
//! - **Distributions**: equal-width histograms and pairwise correlation
//! - **Reporting**: everything collected into a JSON-serializable [`EdaReport`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use listing_eda::{AnalysisConfig, Pipeline};
//!
//! let report = Pipeline::builder()
//!     .config(AnalysisConfig::listings_2019())
//!     .build()?
//!     .run("AB_NYC_2019.csv")?;
//!
//! for outliers in &report.outliers {
//!     println!("{}: {} outliers", outliers.column, outliers.outlier_count);
//! }
//! ```
//!
//! # Using the components directly
//!
//! ```rust,ignore
//! use listing_eda::*;
//!
//! let table = load_csv("AB_NYC_2019.csv", &LoadOptions::default())?;
//!
//! let fence = OutlierDetector::default().detect(&table, "price")?.fence;
//! let mean_price = Aggregator::aggregate(
//!     &table,
//!     &GroupSpec::new(["neighbourhood_group", "room_type"], AggregateKind::mean("price")),
//! )?;
//! let describe = Summarizer::summarize(&table, &["room_type", "price"])?;
//! ```

pub mod aggregate;
pub mod config;
pub mod distribution;
pub mod error;
pub mod loader;
pub mod outliers;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{Aggregator, OTHER_LABEL};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError, CorrelationSpec,
    GroupSummarySpec, HistogramSpec, LISTING_COLUMNS, LoadOptions,
};
pub use distribution::{correlation, histogram};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use loader::load_csv;
pub use outliers::{OutlierDetector, OutlierReport, trim_above_quantile};
pub use pipeline::{
    AnalysisStage, ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use profiler::Summarizer;
pub use quality::QualityChecker;
pub use reporting::{EdaReport, ReportGenerator, TrimSummary};
pub use table::{ColumnKind, Table};
pub use types::{
    AggregateCell, AggregateKind, ColumnQuality, ColumnSummary, Correlation, GroupKey, GroupSpec,
    GroupSummary, GroupedAggregate, GroupedSummaries, Histogram, OutlierFence, OutlierSummary,
    QualityReport, ValueCount, ValueCounts,
};
