//! Column summarization.
//!
//! This module produces the descriptive-statistics table of a dataset:
//! - count, distinct values, most frequent value and its frequency for
//!   categorical columns
//! - count, mean, standard deviation, min, quartiles and max for numeric columns
//!
//! It also splits a numeric column by a categorical one and summarizes each
//! group, which gives the figures behind box and violin plots.

pub(crate) mod statistics;

use crate::error::Result;
use crate::table::{ColumnKind, Table};
use crate::types::{ColumnSummary, GroupSummary, GroupedSummaries};
use statistics::{mean, percentile, sample_std, sorted_non_null};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Builds per-column descriptive statistics.
pub struct Summarizer;

impl Summarizer {
    /// Summarize the requested columns, in the order requested.
    ///
    /// Every name is checked before any statistic is computed; a missing
    /// column fails the whole call with `ColumnNotFound`. Columns without a
    /// single non-null value (including every column of an empty table)
    /// are reported as [`ColumnSummary::InsufficientData`].
    pub fn summarize<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Vec<ColumnSummary>> {
        table.require_columns(columns)?;

        columns
            .iter()
            .map(|column| Self::summarize_column(table, column.as_ref()))
            .collect()
    }

    /// Summarize a single column according to its kind.
    pub fn summarize_column(table: &Table, column: &str) -> Result<ColumnSummary> {
        let summary = match table.column_kind(column)? {
            ColumnKind::Numeric => numeric_summary(column, &table.numeric_values(column)?),
            ColumnKind::Categorical => {
                categorical_summary(column, &table.string_values(column)?)
            }
        };
        if summary.is_insufficient() {
            debug!("Column '{}' has no values to summarize", column);
        }
        Ok(summary)
    }

    /// Summarize `value_column` separately for every value of `group_column`.
    ///
    /// Groups are ordered by key. Rows with a null group value are skipped.
    pub fn summarize_by_group(
        table: &Table,
        group_column: &str,
        value_column: &str,
    ) -> Result<GroupedSummaries> {
        table.require_columns(&[group_column, value_column])?;

        let keys = table.string_values(group_column)?;
        let values = table.numeric_values(value_column)?;

        let mut groups: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for (key, value) in keys.into_iter().zip(values) {
            if let Some(key) = key {
                groups.entry(key).or_default().push(value);
            }
        }

        let groups = groups
            .into_iter()
            .map(|(group, values)| GroupSummary {
                summary: numeric_summary(value_column, &values),
                group,
            })
            .collect();

        Ok(GroupedSummaries {
            group_column: group_column.to_string(),
            value_column: value_column.to_string(),
            groups,
        })
    }
}

/// Numeric describe over non-null values.
pub(crate) fn numeric_summary(column: &str, values: &[Option<f64>]) -> ColumnSummary {
    let sorted = sorted_non_null(values);
    let (Some(mean), Some(min), Some(max)) =
        (mean(&sorted), sorted.first().copied(), sorted.last().copied())
    else {
        return ColumnSummary::InsufficientData {
            column: column.to_string(),
        };
    };

    let quartile = |p: f64| percentile(&sorted, p).unwrap_or(min);

    ColumnSummary::Numeric {
        column: column.to_string(),
        count: sorted.len(),
        mean,
        std: sample_std(&sorted),
        min,
        p25: quartile(0.25),
        p50: quartile(0.5),
        p75: quartile(0.75),
        max,
    }
}

/// Categorical describe over non-null values.
///
/// Ties for the most frequent value go to the value seen first.
pub(crate) fn categorical_summary(column: &str, values: &[Option<String>]) -> ColumnSummary {
    // value -> (count, first row seen)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut count = 0;
    for (row, value) in values.iter().enumerate() {
        if let Some(value) = value {
            count += 1;
            counts.entry(value.as_str()).or_insert((0, row)).0 += 1;
        }
    }

    let top = counts
        .iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    match top {
        Some((top, freq)) => ColumnSummary::Categorical {
            column: column.to_string(),
            count,
            unique: counts.len(),
            top,
            freq,
        },
        None => ColumnSummary::InsufficientData {
            column: column.to_string(),
        },
    }
}
