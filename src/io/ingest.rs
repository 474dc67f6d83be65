//! CSV ingest of `(x, y[, sigma])` observations.
//!
//! Schema:
//! - required columns `x` and `y`
//! - optional column `sigma` (per-point standard deviation, must be > 0)
//!
//! Header names are matched case-insensitively with surrounding whitespace and
//! a UTF-8 BOM stripped. Rows that fail to parse are skipped and reported as
//! `RowError`s; the run fails only if no usable row remains.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::DataSet;
use crate::error::AppError;

/// Summary stats about the rows actually kept.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedData {
    pub data: DataSet,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    x: usize,
    y: usize,
    sigma: Option<usize>,
}

/// Load a data set from a CSV file.
///
/// # Errors
/// - exit code 2: the file cannot be opened, or `x`/`y` columns are missing
/// - exit code 3: no valid rows
pub fn load_dataset(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_dataset(file)
}

/// Same as `load_dataset`, from any reader.
pub fn read_dataset<R: std::io::Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid_input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut sigma = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Data starts on line 2 (line 1 is the header).
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, columns) {
            Ok((xi, yi, si)) => {
                x.push(xi);
                y.push(yi);
                if let Some(si) = si {
                    sigma.push(si);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = y.len();
    if !row_errors.is_empty() {
        log::warn!(rows_read = rows_read, rows_skipped = row_errors.len(); "skipped invalid CSV rows");
    }
    if rows_used == 0 {
        return Err(AppError::insufficient_data("No valid rows in the CSV input."));
    }

    let mut data = DataSet::new(x, y);
    if columns.sigma.is_some() {
        data = data.with_sigma(sigma);
    }
    let stats = compute_stats(&data)
        .ok_or_else(|| AppError::insufficient_data("No valid points in the CSV input."))?;

    Ok(IngestedData {
        data,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, AppError> {
    let required = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::invalid_input(format!("Missing required column: `{name}`")))
    };
    Ok(Columns {
        x: required("x")?,
        y: required("y")?,
        sigma: header_map.get("sigma").copied(),
    })
}

fn parse_row(record: &StringRecord, columns: Columns) -> Result<(f64, f64, Option<f64>), String> {
    let x = parse_f64(record, columns.x, "x")?;
    let y = parse_f64(record, columns.y, "y")?;
    let sigma = match columns.sigma {
        Some(idx) => {
            let s = parse_f64(record, idx, "sigma")?;
            if s <= 0.0 {
                return Err(format!("`sigma` must be > 0, got {s}"));
            }
            Some(s)
        }
        None => None,
    };
    Ok((x, y, sigma))
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing value for `{name}`"))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid number for `{name}`: '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("Non-finite value for `{name}`: '{raw}'"));
    }
    Ok(value)
}

fn compute_stats(data: &DataSet) -> Option<DatasetStats> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for (&x, &y) in data.x.iter().zip(data.y.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !x_min.is_finite() || !x_max.is_finite() || !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }

    Some(DatasetStats {
        n_points: data.len(),
        x_min,
        x_max,
        y_min,
        y_max,
    })
}
