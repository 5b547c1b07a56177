//! Grouped aggregation.
//!
//! Groups rows by one or two categorical columns and computes row counts,
//! means of a numeric target, or each cell's share of its first-key group.
//! Also provides value counts and top-N breakdowns of a single column.

use crate::error::{AnalysisError, Result};
use crate::table::Table;
use crate::types::{
    AggregateCell, AggregateKind, GroupKey, GroupSpec, GroupedAggregate, ValueCount, ValueCounts,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Label of the bucket holding values outside the top N.
pub const OTHER_LABEL: &str = "Other";

/// Computes grouped aggregates over a table.
pub struct Aggregator;

impl Aggregator {
    /// Group `table` according to `spec`.
    ///
    /// Columns are validated before any grouping happens. Rows with a null
    /// grouping value are skipped. For [`AggregateKind::Mean`], null targets
    /// are ignored and groups without any target value are left out.
    pub fn aggregate(table: &Table, spec: &GroupSpec) -> Result<GroupedAggregate> {
        Self::validate(table, spec)?;

        let keys = Self::group_keys(table, &spec.by)?;

        let cells = match &spec.kind {
            AggregateKind::Count => Self::counts(&keys)
                .into_iter()
                .map(|(key, count)| AggregateCell {
                    key,
                    value: count as f64,
                })
                .collect(),
            AggregateKind::Mean { target } => Self::means(&keys, &table.numeric_values(target)?),
            AggregateKind::FractionOfRowTotal => Self::fractions(Self::counts(&keys)),
        };

        let aggregate = GroupedAggregate {
            group_columns: spec.by.clone(),
            kind: spec.kind.clone(),
            cells,
        };
        debug!(
            "Aggregated {} by {:?}: {} groups",
            spec.kind.label(),
            spec.by,
            aggregate.len()
        );
        Ok(aggregate)
    }

    fn validate(table: &Table, spec: &GroupSpec) -> Result<()> {
        match (spec.by.len(), &spec.kind) {
            (0, _) => {
                return Err(AnalysisError::InvalidGrouping(
                    "at least one grouping column is required".to_string(),
                ));
            }
            (n, _) if n > 2 => {
                return Err(AnalysisError::InvalidGrouping(format!(
                    "at most two grouping columns are supported, got {}",
                    n
                )));
            }
            (n, AggregateKind::FractionOfRowTotal) if n != 2 => {
                return Err(AnalysisError::InvalidGrouping(
                    "fraction of row total needs exactly two grouping columns".to_string(),
                ));
            }
            _ => {}
        }

        table.require_columns(&spec.by)?;
        if let AggregateKind::Mean { target } = &spec.kind {
            table.require_columns(&[target])?;
            // Fails with NotNumeric before grouping.
            table.numeric_values(target)?;
        }
        Ok(())
    }

    /// Group key of every row; `None` when any grouping value is null.
    fn group_keys(table: &Table, by: &[String]) -> Result<Vec<Option<GroupKey>>> {
        let columns = by
            .iter()
            .map(|name| table.string_values(name))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..table.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|values| values[row].clone())
                    .collect::<Option<GroupKey>>()
            })
            .collect())
    }

    fn counts(keys: &[Option<GroupKey>]) -> BTreeMap<GroupKey, usize> {
        let mut counts = BTreeMap::new();
        for key in keys.iter().flatten() {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn means(keys: &[Option<GroupKey>], targets: &[Option<f64>]) -> Vec<AggregateCell> {
        let mut sums: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
        for (key, target) in keys.iter().zip(targets) {
            if let (Some(key), Some(value)) = (key, target)
                && !value.is_nan()
            {
                let entry = sums.entry(key.clone()).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(key, (sum, n))| AggregateCell {
                key,
                value: sum / n as f64,
            })
            .collect()
    }

    fn fractions(counts: BTreeMap<GroupKey, usize>) -> Vec<AggregateCell> {
        let mut row_totals: HashMap<String, usize> = HashMap::new();
        for (key, count) in &counts {
            *row_totals.entry(key[0].clone()).or_insert(0) += count;
        }
        counts
            .into_iter()
            .map(|(key, count)| {
                let total = row_totals.get(&key[0]).copied().unwrap_or(count);
                AggregateCell {
                    value: count as f64 / total as f64,
                    key,
                }
            })
            .collect()
    }

    /// Frequency of every non-null value, most frequent first.
    ///
    /// Ties keep the order in which values first appear.
    pub fn value_counts(table: &Table, column: &str) -> Result<ValueCounts> {
        let values = table.string_values(column)?;

        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in values.iter().flatten() {
            let count = counts.entry(value.as_str()).or_insert(0);
            if *count == 0 {
                order.push(value.as_str());
            }
            *count += 1;
        }

        let mut counts: Vec<ValueCount> = order
            .into_iter()
            .map(|value| ValueCount {
                value: value.to_string(),
                count: counts[value],
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        counts.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(ValueCounts {
            column: column.to_string(),
            counts,
        })
    }

    /// The `n` most frequent values plus an "Other" bucket for the rest.
    ///
    /// The bucket is only added when something falls outside the top `n`.
    /// A value already named "Other" is folded into the bucket, so the label
    /// appears once.
    pub fn top_n_with_other(table: &Table, column: &str, n: usize) -> Result<ValueCounts> {
        if n == 0 {
            return Err(AnalysisError::InvalidArgument(
                "top-N needs n of at least 1".to_string(),
            ));
        }

        let all = Self::value_counts(table, column)?;
        let mut counts = Vec::with_capacity(n + 1);
        let mut rest: Option<usize> = None;
        for value_count in all.counts {
            if value_count.value != OTHER_LABEL && counts.len() < n {
                counts.push(value_count);
            } else {
                *rest.get_or_insert(0) += value_count.count;
            }
        }

        if let Some(rest) = rest {
            counts.push(ValueCount {
                value: OTHER_LABEL.to_string(),
                count: rest,
            });
        }
        Ok(ValueCounts {
            column: all.column,
            counts,
        })
    }
}
