//! Custom error types for the listing analysis pipeline.
//!
//! This module provides the error hierarchy using `thiserror` for every
//! stage of the pipeline: loading, quality checks, outlier detection,
//! aggregation and summarization.
//!
//! Errors are serializable so they can be embedded in JSON output next to
//! a partially built report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// A numeric operation was requested on a non-numeric column.
    #[error("Column '{column}' is not numeric (dtype: {dtype})")]
    NotNumeric { column: String, dtype: String },

    /// Percentile or mean computation has no values to work with.
    #[error("Insufficient data in column '{0}'")]
    InsufficientData(String),

    /// A record in the input file has the wrong number of fields.
    #[error("Malformed record {record}: expected {expected} fields, found {found}")]
    MalformedRecord {
        record: usize,
        expected: usize,
        found: usize,
    },

    /// A value in a declared numeric column could not be parsed.
    #[error("Failed to parse value '{value}' in column '{column}' at row {row}")]
    RowParse {
        column: String,
        row: usize,
        value: String,
    },

    /// Grouping request is not supported.
    #[error("Invalid grouping: {0}")]
    InvalidGrouping(String),

    /// An argument is outside its valid range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NotNumeric { .. } => "NOT_NUMERIC",
            Self::InsufficientData(_) => "INSUFFICIENT_DATA",
            Self::MalformedRecord { .. } => "MALFORMED_RECORD",
            Self::RowParse { .. } => "ROW_PARSE_ERROR",
            Self::InvalidGrouping(_) => "INVALID_GROUPING",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is an insufficient-data condition.
    ///
    /// Looks through any context wrappers.
    pub fn is_insufficient_data(&self) -> bool {
        match self {
            Self::InsufficientData(_) => true,
            Self::WithContext { source, .. } => source.is_insufficient_data(),
            _ => false,
        }
    }

    /// Check if this error happened while reading the input file.
    pub fn is_load_error(&self) -> bool {
        match self {
            Self::Io(_) | Self::MalformedRecord { .. } | Self::RowParse { .. } => true,
            Self::WithContext { source, .. } => source.is_load_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
