//! Delimited-file loading.
//!
//! Reads a header-first delimited text file into a [`Table`]. The file is
//! checked for ragged records before polars parses it, and declared numeric
//! columns are coerced to `Float64` or the whole load fails.

use crate::config::LoadOptions;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::table::Table;
use crate::utils::{is_numeric_dtype, parse_numeric_string};
use csv::ReaderBuilder;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use tracing::{debug, info};

/// Load a delimited file into a [`Table`].
///
/// Fails with:
/// - `Io` when the file is missing, unreadable or has no header row
/// - `MalformedRecord` when a record's field count differs from the header's
/// - `ColumnNotFound` when a required or numeric column is absent
/// - `RowParse` when a value in a numeric column is not a finite number
pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Table> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    check_structure(&content, options)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_n_rows(options.row_limit)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(options.delimiter)
                .with_quote_char(Some(b'"')),
        )
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    let table = Table::new(df);
    table.require_columns(&options.required_columns)?;
    table.require_columns(&options.numeric_columns)?;

    let table = coerce_numeric_columns(table, &options.numeric_columns)?;

    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        table.height(),
        table.width()
    );
    Ok(table)
}

/// Compare every record's field count with the header's.
///
/// Records are numbered from 1, the header being record 1. Only the records
/// polars will read are checked when a row limit is set.
fn check_structure(content: &str, options: &LoadOptions) -> Result<()> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(false)
        .from_reader(content.as_bytes());

    let max_records = options
        .row_limit
        .map_or(usize::MAX, |rows| rows.saturating_add(1));

    let mut checked = 0;
    for record in reader.records().take(max_records) {
        record.map_err(|e| malformed_record(e, checked + 1))?;
        checked += 1;
    }

    if checked == 0 {
        return Err(AnalysisError::Io(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "file has no header row",
        )));
    }

    debug!("Structure check passed: {} records", checked);
    Ok(())
}

fn malformed_record(error: csv::Error, fallback_record: usize) -> AnalysisError {
    match error.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => AnalysisError::MalformedRecord {
            record: pos
                .as_ref()
                .map_or(fallback_record, |p| p.record() as usize + 1),
            expected: *expected_len as usize,
            found: *len as usize,
        },
        _ => AnalysisError::Io(error.into()),
    }
}

/// Cast declared numeric columns that were inferred as text to `Float64`.
///
/// Currency symbols and thousands separators are stripped before parsing.
/// Columns polars already read as numbers must hold only finite values.
/// Rows are numbered from 1 (the first data row).
fn coerce_numeric_columns(table: Table, columns: &[String]) -> Result<Table> {
    let mut df = table.into_dataframe();

    for name in columns {
        let dtype = df.column(name)?.dtype().clone();
        if is_numeric_dtype(&dtype) {
            reject_non_finite(&df, name)?;
            continue;
        }

        let raw = Table::new(df.select([name.as_str()])?).string_values(name)?;
        let mut parsed: Vec<Option<f64>> = Vec::with_capacity(raw.len());
        for (row, value) in raw.iter().enumerate() {
            let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
            match value {
                None => parsed.push(None),
                Some(v) => match parse_numeric_string(v) {
                    Some(number) => parsed.push(Some(number)),
                    None => {
                        return Err(AnalysisError::RowParse {
                            column: name.clone(),
                            row: row + 1,
                            value: v.to_string(),
                        });
                    }
                },
            }
        }

        debug!("Coerced column '{}' from {} to f64", name, dtype);
        df.replace(name, Series::new(name.as_str().into(), parsed))?;
    }

    Ok(Table::new(df))
}

/// Fail with `RowParse` on the first NaN or infinite value of a column
/// polars already parsed as numeric.
fn reject_non_finite(df: &DataFrame, name: &str) -> Result<()> {
    let values = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let first_bad = values
        .f64()?
        .into_iter()
        .enumerate()
        .find_map(|(row, value)| value.filter(|v| !v.is_finite()).map(|v| (row, v)));

    match first_bad {
        Some((row, value)) => Err(AnalysisError::RowParse {
            column: name.to_string(),
            row: row + 1,
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LISTING_COLUMNS;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "listing_eda_loader_{}_{}.csv",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn listing_options() -> LoadOptions {
        LoadOptions {
            required_columns: LISTING_COLUMNS.iter().map(|c| c.to_string()).collect(),
            numeric_columns: vec!["price".to_string(), "number_of_reviews".to_string()],
            ..Default::default()
        }
    }

    const LISTINGS: &str = "\
id,neighbourhood_group,neighbourhood,room_type,number_of_reviews,price
1,Brooklyn,Kensington,Private room,9,149
2,Manhattan,Midtown,Entire home/apt,45,225
3,Manhattan,Harlem,Private room,0,150
4,Brooklyn,Clinton Hill,Entire home/apt,270,89
";

    #[test]
    fn test_load_listings() {
        let path = write_temp("basic", LISTINGS);
        let table = load_csv(&path, &listing_options()).unwrap();

        assert_eq!(table.shape(), (4, 6));
        assert_eq!(
            table.numeric_values("price").unwrap(),
            vec![Some(149.0), Some(225.0), Some(150.0), Some(89.0)]
        );
        assert_eq!(
            table.string_values("room_type").unwrap()[1].as_deref(),
            Some("Entire home/apt")
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_row_limit() {
        let path = write_temp("row_limit", LISTINGS);
        let options = LoadOptions {
            row_limit: Some(2),
            ..listing_options()
        };
        assert_eq!(load_csv(&path, &options).unwrap().height(), 2);

        let options = LoadOptions {
            row_limit: Some(100),
            ..listing_options()
        };
        assert_eq!(load_csv(&path, &options).unwrap().height(), 4);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv("/nonexistent/listings.csv", &LoadOptions::default());
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }

    #[test]
    fn test_empty_file() {
        let path = write_temp("empty", "");
        let result = load_csv(&path, &LoadOptions::default());
        assert!(matches!(result, Err(AnalysisError::Io(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_ragged_record() {
        let path = write_temp("ragged", "room_type,price\nA,100\nB,200,extra\nC,300\n");
        let result = load_csv(&path, &LoadOptions::default());
        assert!(matches!(
            result,
            Err(AnalysisError::MalformedRecord {
                record: 3,
                expected: 2,
                found: 3
            })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_ragged_record_beyond_row_limit_is_not_read() {
        let path = write_temp("ragged_limit", "room_type,price\nA,100\nB,200,extra\n");
        let options = LoadOptions {
            row_limit: Some(1),
            ..Default::default()
        };
        assert_eq!(load_csv(&path, &options).unwrap().height(), 1);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_quoted_delimiter_is_not_ragged() {
        let path = write_temp(
            "quoted",
            "name,price\n\"Cozy, quiet room\",100\n\"Loft\",200\n",
        );
        let table = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(
            table.string_values("name").unwrap()[0].as_deref(),
            Some("Cozy, quiet room")
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_stray_quote_inside_field_is_not_ragged() {
        let content = "name,price\n55\" TV loft,100\nB,200\nC,300\n";
        assert!(check_structure(content, &LoadOptions::default()).is_ok());
    }

    #[test]
    fn test_quoted_newline_stays_in_one_record() {
        let content = "name,price\n\"Loft\nwith view\",200\nB,300,extra\n";
        let result = check_structure(content, &LoadOptions::default());
        assert!(matches!(
            result,
            Err(AnalysisError::MalformedRecord {
                record: 3,
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_missing_required_column() {
        let path = write_temp("missing_col", "room_type,price\nA,100\n");
        let result = load_csv(&path, &listing_options());
        assert!(matches!(
            result,
            Err(AnalysisError::ColumnNotFound(c)) if c == "neighbourhood_group"
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_bad_numeric_value_fails_load() {
        let path = write_temp("bad_price", "room_type,price\nA,100\nB,call me\nC,300\n");
        let options = LoadOptions {
            numeric_columns: vec!["price".to_string()],
            ..Default::default()
        };
        let result = load_csv(&path, &options);
        assert!(matches!(
            result,
            Err(AnalysisError::RowParse { column, row: 2, value })
                if column == "price" && value == "call me"
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_nan_in_numeric_column_fails_load() {
        let path = write_temp("nan_price", "room_type,price\nA,10\nB,NaN\nC,30\n");
        let options = LoadOptions {
            numeric_columns: vec!["price".to_string()],
            ..Default::default()
        };
        let result = load_csv(&path, &options);
        assert!(matches!(
            result,
            Err(AnalysisError::RowParse { column, row: 2, value })
                if column == "price" && value == "NaN"
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_infinite_value_in_float_column_fails_load() {
        let path = write_temp("inf_price", "room_type,price\nA,10.5\nB,20.5\nC,inf\n");
        let options = LoadOptions {
            numeric_columns: vec!["price".to_string()],
            ..Default::default()
        };
        let err = load_csv(&path, &options).unwrap_err();
        assert_eq!(err.error_code(), "ROW_PARSE_ERROR");
        assert!(matches!(
            err,
            AnalysisError::RowParse { row: 3, value, .. } if value == "inf"
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_formatted_numbers_are_coerced() {
        let path = write_temp(
            "currency",
            "room_type,price\nA,$100\nB,\"$1,200\"\nC,\n",
        );
        let options = LoadOptions {
            numeric_columns: vec!["price".to_string()],
            ..Default::default()
        };
        let table = load_csv(&path, &options).unwrap();
        assert_eq!(table.dtype("price").unwrap(), DataType::Float64);
        assert_eq!(
            table.numeric_values("price").unwrap(),
            vec![Some(100.0), Some(1200.0), None]
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_custom_delimiter() {
        let path = write_temp("semicolon", "room_type;price\nA;100\nB;200\n");
        let options = LoadOptions {
            delimiter: b';',
            numeric_columns: vec!["price".to_string()],
            ..Default::default()
        };
        let table = load_csv(&path, &options).unwrap();
        assert_eq!(table.column_names(), vec!["room_type", "price"]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_header_only_file_is_empty_table() {
        let path = write_temp("header_only", "room_type,price\n");
        let options = LoadOptions {
            numeric_columns: vec!["price".to_string()],
            ..Default::default()
        };
        let table = load_csv(&path, &options).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 2);
        std::fs::remove_file(path).ok();
    }
}
