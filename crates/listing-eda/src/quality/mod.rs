//! Data quality checks.
//!
//! This module reports missing values per column, duplicate rows and
//! column data types.

mod checker;

pub use checker::QualityChecker;
