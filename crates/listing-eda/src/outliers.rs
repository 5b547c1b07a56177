//! Outlier detection module.
//!
//! Computes interquartile-range fences for numeric columns and partitions
//! rows into those inside and outside the fence. Also trims a table at a
//! percentile of one column.

use crate::error::{AnalysisError, Result};
use crate::profiler::statistics::{percentile, sorted_non_null};
use crate::table::Table;
use crate::types::{OutlierFence, OutlierSummary};
use tracing::debug;

/// Default multiplier applied to the IQR.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Outlier fence of a column together with the rows outside it.
#[derive(Debug, Clone)]
pub struct OutlierReport {
    pub column: String,
    pub fence: OutlierFence,
    /// Non-null values inspected.
    pub total: usize,
    /// Rows whose value lies strictly outside the fence.
    pub outliers: Table,
    pub below_lower: usize,
    pub above_upper: usize,
}

impl OutlierReport {
    pub fn outlier_count(&self) -> usize {
        self.outliers.height()
    }

    /// Serializable view without the row data.
    pub fn summary(&self) -> OutlierSummary {
        OutlierSummary {
            column: self.column.clone(),
            fence: self.fence,
            total: self.total,
            outlier_count: self.outlier_count(),
            below_lower: self.below_lower,
            above_upper: self.above_upper,
        }
    }
}

/// IQR-based outlier detection.
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector {
    multiplier: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl OutlierDetector {
    /// Detector with a custom IQR multiplier.
    pub fn with_multiplier(multiplier: f64) -> Result<Self> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(AnalysisError::InvalidArgument(format!(
                "IQR multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(Self { multiplier })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Compute the fence of a numeric column.
    ///
    /// Nulls are ignored. Fails with `InsufficientData` when the column has
    /// no non-null values.
    pub fn fence(&self, table: &Table, column: &str) -> Result<OutlierFence> {
        let values = table.numeric_values(column)?;
        self.fence_of(column, &values)
    }

    fn fence_of(&self, column: &str, values: &[Option<f64>]) -> Result<OutlierFence> {
        let sorted = sorted_non_null(values);
        let (Some(q1), Some(q3)) = (percentile(&sorted, 0.25), percentile(&sorted, 0.75)) else {
            return Err(AnalysisError::InsufficientData(column.to_string()));
        };
        Ok(OutlierFence::from_quartiles(q1, q3, self.multiplier))
    }

    /// Compute the fence of a numeric column and collect the rows outside it.
    ///
    /// A column with few distinct values may produce a zero-width fence, in
    /// which case every value off the quartile is flagged.
    pub fn detect(&self, table: &Table, column: &str) -> Result<OutlierReport> {
        let values = table.numeric_values(column)?;
        let fence = self.fence_of(column, &values)?;

        let mut below_lower = 0;
        let mut above_upper = 0;
        let mask: Vec<bool> = values
            .iter()
            .map(|value| match value {
                Some(v) if *v < fence.lower => {
                    below_lower += 1;
                    true
                }
                Some(v) if *v > fence.upper => {
                    above_upper += 1;
                    true
                }
                _ => false,
            })
            .collect();

        let outliers = table.filter_rows(&mask)?;
        let total = values.iter().flatten().count();

        debug!(
            "Column '{}': fence [{:.2}, {:.2}], {} of {} values outside",
            column,
            fence.lower,
            fence.upper,
            outliers.height(),
            total
        );

        Ok(OutlierReport {
            column: column.to_string(),
            fence,
            total,
            outliers,
            below_lower,
            above_upper,
        })
    }
}

/// Keep the rows whose `column` value is at or below its `quantile` percentile.
///
/// Rows with a null value are dropped. `quantile` must lie in `[0, 1]`.
pub fn trim_above_quantile(table: &Table, column: &str, quantile: f64) -> Result<Table> {
    if !(0.0..=1.0).contains(&quantile) {
        return Err(AnalysisError::InvalidArgument(format!(
            "quantile must be between 0.0 and 1.0, got {}",
            quantile
        )));
    }

    let values = table.numeric_values(column)?;
    let sorted = sorted_non_null(&values);
    let limit = percentile(&sorted, quantile)
        .ok_or_else(|| AnalysisError::InsufficientData(column.to_string()))?;

    let mask: Vec<bool> = values
        .iter()
        .map(|value| value.is_some_and(|v| v <= limit))
        .collect();

    let trimmed = table.filter_rows(&mask)?;
    debug!(
        "Trimmed '{}' at p{:.0} = {:.2}: kept {} of {} rows",
        column,
        quantile * 100.0,
        limit,
        trimmed.height(),
        table.height()
    );
    Ok(trimmed)
}
