//! Distribution shape of numeric columns.
//!
//! Equal-width histograms and pairwise correlation, the numbers behind the
//! histogram and scatter charts of an exploratory analysis.

use crate::error::{AnalysisError, Result};
use crate::profiler::statistics::{pearson, sorted_non_null};
use crate::table::Table;
use crate::types::{Correlation, Histogram};
use tracing::debug;

/// Count the values of a numeric column into `bins` equal-width bins.
///
/// With a `range`, values outside `[lower, upper]` are counted in
/// [`Histogram::outside`] instead of a bin. Without one the range spans the
/// column's minimum and maximum, widened by 0.5 on each side when they are
/// equal. Nulls and NaNs are ignored.
pub fn histogram(
    table: &Table,
    column: &str,
    bins: usize,
    range: Option<(f64, f64)>,
) -> Result<Histogram> {
    if bins == 0 {
        return Err(AnalysisError::InvalidArgument(
            "histogram needs at least one bin".to_string(),
        ));
    }
    if let Some((lower, upper)) = range
        && !(lower.is_finite() && upper.is_finite() && lower < upper)
    {
        return Err(AnalysisError::InvalidArgument(format!(
            "histogram range [{}, {}] is empty",
            lower, upper
        )));
    }

    let values = sorted_non_null(&table.numeric_values(column)?);
    let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
        return Err(AnalysisError::InsufficientData(column.to_string()));
    };

    let (lower, upper) = match range {
        Some(range) => range,
        None if min == max => (min - 0.5, max + 0.5),
        None => (min, max),
    };
    let width = (upper - lower) / bins as f64;

    let mut edges: Vec<f64> = (0..bins).map(|i| lower + width * i as f64).collect();
    edges.push(upper);

    let mut counts = vec![0; bins];
    let mut outside = 0;
    for value in values {
        if value < lower || value > upper {
            outside += 1;
        } else {
            let index = (((value - lower) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }
    }

    debug!(
        "Histogram of '{}': {} bins over [{}, {}], {} outside",
        column, bins, lower, upper, outside
    );

    Ok(Histogram {
        column: column.to_string(),
        edges,
        counts,
        outside,
    })
}

/// Pearson correlation between two numeric columns.
///
/// Only rows where both values are present take part. Fails with
/// `InsufficientData` when no such row exists.
pub fn correlation(table: &Table, x: &str, y: &str) -> Result<Correlation> {
    table.require_columns(&[x, y])?;

    let xs = table.numeric_values(x)?;
    let ys = table.numeric_values(y)?;
    let pairs: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((a, b)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return Err(AnalysisError::InsufficientData(format!("{} / {}", x, y)));
    }

    Ok(Correlation {
        x: x.to_string(),
        y: y.to_string(),
        pairs: pairs.len(),
        pearson: pearson(&pairs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn reviews_and_prices() -> Table {
        Table::new(
            df![
                "number_of_reviews" => [Some(1.0), Some(2.0), Some(2.0), Some(3.0), Some(9.0), Some(50.0)],
                "price" => [Some(300.0), Some(200.0), None, Some(150.0), Some(90.0), Some(60.0)],
                "room_type" => ["A", "B", "A", "A", "B", "C"],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_histogram_with_range() {
        let histogram =
            histogram(&reviews_and_prices(), "number_of_reviews", 5, Some((0.0, 10.0))).unwrap();

        assert_eq!(histogram.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(histogram.counts, vec![1, 3, 0, 0, 1]);
        assert_eq!(histogram.outside, 1);
        assert_eq!(histogram.total(), 5);
    }

    #[test]
    fn test_histogram_spans_data_without_range() {
        let table = Table::new(df!["price" => [1i64, 2, 3, 4, 5]].unwrap());
        let histogram = histogram(&table, "price", 2, None).unwrap();

        // The maximum lands in the last, closed bin.
        assert_eq!(histogram.edges, vec![1.0, 3.0, 5.0]);
        assert_eq!(histogram.counts, vec![2, 3]);
        assert_eq!(histogram.outside, 0);
    }

    #[test]
    fn test_histogram_constant_column() {
        let table = Table::new(df!["price" => [7.0, 7.0]].unwrap());
        let histogram = histogram(&table, "price", 1, None).unwrap();
        assert_eq!(histogram.edges, vec![6.5, 7.5]);
        assert_eq!(histogram.counts, vec![2]);
    }

    #[test]
    fn test_histogram_invalid_arguments() {
        let table = reviews_and_prices();
        assert!(matches!(
            histogram(&table, "price", 0, None),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(matches!(
            histogram(&table, "price", 10, Some((100.0, 100.0))),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(matches!(
            histogram(&table, "room_type", 10, None),
            Err(AnalysisError::NotNumeric { .. })
        ));
        assert!(matches!(
            histogram(&table, "minimum_nights", 10, None),
            Err(AnalysisError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_histogram_empty_column() {
        let table = Table::new(df!["price" => [None::<f64>, None]].unwrap());
        let result = histogram(&table, "price", 10, Some((0.0, 1500.0)));
        assert!(result.unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_correlation_skips_incomplete_pairs() {
        let result = correlation(&reviews_and_prices(), "number_of_reviews", "price").unwrap();

        assert_eq!(result.pairs, 5);
        let r = result.pearson.unwrap();
        assert!(r < 0.0 && r >= -1.0);
    }

    #[test]
    fn test_correlation_constant_column_has_no_coefficient() {
        let table = Table::new(
            df![
                "number_of_reviews" => [1.0, 2.0, 3.0],
                "price" => [100.0, 100.0, 100.0],
            ]
            .unwrap(),
        );
        let result = correlation(&table, "number_of_reviews", "price").unwrap();
        assert_eq!(result.pairs, 3);
        assert_eq!(result.pearson, None);
    }

    #[test]
    fn test_correlation_errors() {
        let table = reviews_and_prices();
        assert!(matches!(
            correlation(&table, "number_of_reviews", "minimum_nights"),
            Err(AnalysisError::ColumnNotFound(c)) if c == "minimum_nights"
        ));

        let empty = Table::new(
            df![
                "number_of_reviews" => [Some(1.0), None],
                "price" => [None, Some(2.0)],
            ]
            .unwrap(),
        );
        assert!(
            correlation(&empty, "number_of_reviews", "price")
                .unwrap_err()
                .is_insufficient_data()
        );
    }
}
