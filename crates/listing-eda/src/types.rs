//! Shared data types produced by the analysis stages.
//!
//! Everything here is plain data and serializes into the JSON report.

use crate::table::ColumnKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// Quality
// ============================================================================

/// Missing-value facts for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub column: String,
    /// Polars dtype name (e.g. "i64", "str").
    pub dtype: String,
    pub kind: ColumnKind,
    pub has_missing: bool,
    pub missing_count: usize,
}

/// Output of the quality checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub row_count: usize,
    pub column_count: usize,
    /// One entry per column, in table order.
    pub columns: Vec<ColumnQuality>,
    /// Rows minus distinct full-row tuples.
    pub duplicate_rows: usize,
    /// Rows with no missing value in any column.
    pub complete_rows: usize,
}

impl QualityReport {
    /// Columns that contain at least one missing value.
    pub fn columns_with_missing(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.has_missing)
            .map(|c| c.column.as_str())
            .collect()
    }

    /// Total number of missing cells.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }
}

// ============================================================================
// Outliers
// ============================================================================

/// IQR fence of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierFence {
    /// Build a fence from the quartiles and the IQR multiplier.
    pub fn from_quartiles(q1: f64, q3: f64, multiplier: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        }
    }

    /// True when `value` lies strictly outside `[lower, upper]`.
    #[inline]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Serializable outcome of outlier detection for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub column: String,
    pub fence: OutlierFence,
    /// Non-null values inspected.
    pub total: usize,
    pub outlier_count: usize,
    pub below_lower: usize,
    pub above_upper: usize,
}

impl OutlierSummary {
    pub fn outlier_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.outlier_count as f64 / self.total as f64 * 100.0
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// What a grouped aggregate computes per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Number of rows in the group
    Count,
    /// Mean of a numeric target column
    Mean { target: String },
    /// Count divided by the total of the first-key group (two keys only)
    FractionOfRowTotal,
}

impl AggregateKind {
    pub fn mean(target: impl Into<String>) -> Self {
        Self::Mean {
            target: target.into(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Count => "count".to_string(),
            Self::Mean { target } => format!("mean({})", target),
            Self::FractionOfRowTotal => "fraction".to_string(),
        }
    }
}

/// A grouping request: one or two key columns and an aggregate kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub by: Vec<String>,
    pub kind: AggregateKind,
}

impl GroupSpec {
    pub fn new<I, S>(by: I, kind: AggregateKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            kind,
        }
    }
}

/// Values of the grouping columns identifying one group.
pub type GroupKey = Vec<String>;

/// One cell of a grouped aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateCell {
    pub key: GroupKey,
    pub value: f64,
}

/// Result of grouping a table.
///
/// Cells are ordered by key (lexicographic, like a sorted group-by).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedAggregate {
    pub group_columns: Vec<String>,
    pub kind: AggregateKind,
    pub cells: Vec<AggregateCell>,
}

impl GroupedAggregate {
    /// Look up the value of a group.
    pub fn get(&self, key: &[&str]) -> Option<f64> {
        self.cells
            .iter()
            .find(|cell| {
                cell.key.len() == key.len() && cell.key.iter().zip(key).all(|(a, b)| a == b)
            })
            .map(|cell| cell.value)
    }

    /// Distinct first-dimension keys, in order.
    pub fn first_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for cell in &self.cells {
            if let Some(first) = cell.key.first()
                && keys.last() != Some(&first.as_str())
            {
                keys.push(first);
            }
        }
        keys
    }

    /// Cells whose first key equals `first`.
    pub fn row(&self, first: &str) -> Vec<&AggregateCell> {
        self.cells
            .iter()
            .filter(|cell| cell.key.first().map(String::as_str) == Some(first))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Frequency of one categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Value counts of a column, optionally folded into top-N plus "Other".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCounts {
    pub column: String,
    pub counts: Vec<ValueCount>,
}

impl ValueCounts {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Descriptive statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnSummary {
    /// Categorical column: count, distinct values, most frequent value.
    Categorical {
        column: String,
        count: usize,
        unique: usize,
        top: String,
        freq: usize,
    },
    /// Numeric column: moments and percentiles.
    Numeric {
        column: String,
        count: usize,
        mean: f64,
        /// Sample standard deviation; `None` with fewer than two values.
        std: Option<f64>,
        min: f64,
        p25: f64,
        p50: f64,
        p75: f64,
        max: f64,
    },
    /// No non-null values to summarize.
    InsufficientData { column: String },
}

impl ColumnSummary {
    pub fn column(&self) -> &str {
        match self {
            Self::Categorical { column, .. }
            | Self::Numeric { column, .. }
            | Self::InsufficientData { column } => column,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Numeric summary of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: String,
    pub summary: ColumnSummary,
}

/// Numeric summaries of a value column split by a group column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedSummaries {
    pub group_column: String,
    pub value_column: String,
    pub groups: Vec<GroupSummary>,
}

// ============================================================================
// Distributions
// ============================================================================

/// Equal-width histogram of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub column: String,
    /// `bins + 1` ascending edges. Every bin is half-open except the last,
    /// which includes its upper edge.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Non-null values that fell outside the histogram range.
    pub outside: usize,
}

impl Histogram {
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Values counted into a bin.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(lower, upper)` edges of bin `index`.
    pub fn bin_range(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.edges.get(index)?, *self.edges.get(index + 1)?))
    }
}

/// Relationship between two numeric columns, the figures behind a scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub x: String,
    pub y: String,
    /// Rows where both values are present.
    pub pairs: usize,
    /// Pearson coefficient; `None` below two pairs or with a constant column.
    pub pearson: Option<f64>,
}
