use crate::error::Result;
use crate::table::{ColumnKind, Table};
use crate::types::{ColumnQuality, QualityReport};
use crate::utils::dtype_name;
use polars::prelude::*;
use tracing::debug;

/// Reports missing values, duplicate rows and column types of a table.
pub struct QualityChecker;

impl QualityChecker {
    /// Run every quality check. The table is not modified.
    pub fn check(table: &Table) -> Result<QualityReport> {
        let columns = Self::missing_values(table)?;
        let duplicate_rows = Self::duplicate_rows(table)?;
        let complete_rows = Self::complete_rows(table)?;

        debug!(
            "Quality check: {} duplicate rows, {} of {} rows complete",
            duplicate_rows,
            complete_rows,
            table.height()
        );

        Ok(QualityReport {
            row_count: table.height(),
            column_count: table.width(),
            columns,
            duplicate_rows,
            complete_rows,
        })
    }

    /// Missing-value count and dtype of every column, in table order.
    pub fn missing_values(table: &Table) -> Result<Vec<ColumnQuality>> {
        table
            .column_names()
            .into_iter()
            .map(|name| {
                let series = table.series(&name)?;
                let missing_count = series.null_count();
                Ok(ColumnQuality {
                    dtype: dtype_name(series.dtype()),
                    kind: ColumnKind::of(series.dtype()),
                    has_missing: missing_count > 0,
                    missing_count,
                    column: name,
                })
            })
            .collect()
    }

    /// Rows minus distinct full-row tuples. Nulls compare equal.
    pub fn duplicate_rows(table: &Table) -> Result<usize> {
        let df = table.dataframe();
        if df.width() == 0 {
            return Ok(0);
        }
        let distinct = df
            .unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?
            .height();
        Ok(df.height() - distinct)
    }

    /// Rows that would survive dropping every row with a missing value.
    pub fn complete_rows(table: &Table) -> Result<usize> {
        let mut complete = vec![true; table.height()];
        for name in table.column_names() {
            let series = table.series(&name)?;
            if series.null_count() == 0 {
                continue;
            }
            for (row, is_null) in series.is_null().into_iter().enumerate() {
                if is_null.unwrap_or(false) {
                    complete[row] = false;
                }
            }
        }
        Ok(complete.into_iter().filter(|&keep| keep).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listings() -> Table {
        Table::new(
            df![
                "name" => [Some("Cozy loft"), None, Some("Cozy loft"), Some("Studio")],
                "room_type" => ["Private room", "Entire home/apt", "Private room", "Shared room"],
                "price" => [100i64, 250, 100, 40],
                "reviews_per_month" => [Some(0.5), Some(1.2), Some(0.5), None],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_missing_values_per_column() {
        let report = QualityChecker::check(&listings()).unwrap();

        assert_eq!(report.row_count, 4);
        assert_eq!(report.column_count, 4);
        let missing: Vec<(&str, bool, usize)> = report
            .columns
            .iter()
            .map(|c| (c.column.as_str(), c.has_missing, c.missing_count))
            .collect();
        assert_eq!(
            missing,
            vec![
                ("name", true, 1),
                ("room_type", false, 0),
                ("price", false, 0),
                ("reviews_per_month", true, 1),
            ]
        );
        assert_eq!(report.columns_with_missing(), vec!["name", "reviews_per_month"]);
        assert_eq!(report.total_missing(), 2);
    }

    #[test]
    fn test_column_types() {
        let report = QualityChecker::check(&listings()).unwrap();
        assert_eq!(report.columns[1].kind, ColumnKind::Categorical);
        assert_eq!(report.columns[2].kind, ColumnKind::Numeric);
        assert_eq!(report.columns[2].dtype, "i64");
    }

    #[test]
    fn test_duplicate_rows() {
        // Rows 0 and 2 are identical.
        let report = QualityChecker::check(&listings()).unwrap();
        assert_eq!(report.duplicate_rows, 1);
    }

    #[test]
    fn test_duplicate_rows_with_nulls() {
        let table = Table::new(
            df![
                "a" => [None, None, Some(1i64)],
                "b" => ["x", "x", "x"],
            ]
            .unwrap(),
        );
        assert_eq!(QualityChecker::duplicate_rows(&table).unwrap(), 1);
    }

    #[test]
    fn test_complete_rows() {
        let report = QualityChecker::check(&listings()).unwrap();
        assert_eq!(report.complete_rows, 2);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(df!["price" => Vec::<i64>::new()].unwrap());
        let report = QualityChecker::check(&table).unwrap();
        assert_eq!(report.row_count, 0);
        assert_eq!(report.duplicate_rows, 0);
        assert_eq!(report.complete_rows, 0);
        assert!(!report.columns[0].has_missing);
    }
}
