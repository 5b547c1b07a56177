//! In-memory table shared by every pipeline stage.
//!
//! [`Table`] wraps a polars [`DataFrame`] and adds the lookups the analysis
//! stages need: name-checked column access, numeric/categorical extraction,
//! and row filtering into new tables. A table is never mutated after load.

use crate::error::{AnalysisError, Result};
use crate::utils::{dtype_name, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How a column is summarized and grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// Everything else (strings, booleans, categoricals)
    Categorical,
}

impl ColumnKind {
    /// Classify a polars dtype.
    pub fn of(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }
}

/// An immutable table of named, typed columns.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
}

static_assertions::assert_impl_all!(Table: Send, Sync);

impl Table {
    /// Wrap an existing DataFrame.
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.df.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Borrow the underlying DataFrame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }

    /// Fail with `ColumnNotFound` for the first name that is missing.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            if !self.has_column(name) {
                return Err(AnalysisError::ColumnNotFound(name.to_string()));
            }
        }
        Ok(())
    }

    /// Look up a column as a materialized series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| AnalysisError::ColumnNotFound(name.to_string()))
    }

    pub fn dtype(&self, name: &str) -> Result<DataType> {
        Ok(self.series(name)?.dtype().clone())
    }

    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(ColumnKind::of(self.series(name)?.dtype()))
    }

    /// Values of a numeric column as `f64`, nulls preserved in row order.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self.series(name)?;
        if !is_numeric_dtype(series.dtype()) {
            return Err(AnalysisError::NotNumeric {
                column: name.to_string(),
                dtype: dtype_name(series.dtype()),
            });
        }
        let float_series = series.cast(&DataType::Float64)?;
        Ok(float_series.f64()?.into_iter().collect())
    }

    /// Values of any column rendered as strings, nulls preserved in row order.
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.series(name)?;
        let str_series = series.cast(&DataType::String)?;
        Ok(str_series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.height() {
            return Err(AnalysisError::InvalidArgument(format!(
                "row mask has {} entries but table has {} rows",
                mask.len(),
                self.height()
            )));
        }
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(Table::new(self.df.filter(&mask)?))
    }
}

impl From<DataFrame> for Table {
    fn from(df: DataFrame) -> Self {
        Table::new(df)
    }
}
