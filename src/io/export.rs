//! Exports: data sets to CSV, reports to JSON.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::DataSet;
use crate::error::AppError;

/// Write a data set as `x,y[,sigma]` CSV, readable by `load_dataset`.
pub fn write_dataset(path: &Path, data: &DataSet) -> Result<(), AppError> {
    data.validate()?;
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create CSV '{}': {e}", path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::invalid_input(format!("Failed to write CSV row: {e}"));

    match &data.sigma {
        Some(sigma) => {
            writer.write_record(["x", "y", "sigma"]).map_err(write_err)?;
            for ((x, y), s) in data.x.iter().zip(data.y.iter()).zip(sigma.iter()) {
                writer
                    .write_record([x.to_string(), y.to_string(), s.to_string()])
                    .map_err(write_err)?;
            }
        }
        None => {
            writer.write_record(["x", "y"]).map_err(write_err)?;
            for (x, y) in data.x.iter().zip(data.y.iter()) {
                writer
                    .write_record([x.to_string(), y.to_string()])
                    .map_err(write_err)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::invalid_input(format!("Failed to flush CSV '{}': {e}", path.display())))?;
    log::info!(path:% = path.display(), rows = data.len(); "wrote data set");
    Ok(())
}

/// Write any serializable report as pretty JSON.
///
/// Non-finite floats (e.g. an undefined AICc) are written as `null`.
pub fn write_report_json<T: Serialize>(path: &Path, report: &T) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create report JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::invalid_input(format!("Failed to write report JSON: {e}")))?;
    log::info!(path:% = path.display(); "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_dataset;
    use crate::score::InformationCriteria;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fit-aic-{}-{name}", std::process::id()))
    }

    #[test]
    fn dataset_csv_reads_back() {
        let path = temp_path("data.csv");
        let data = DataSet::new(vec![0.0, 0.5, 1.0], vec![1.0, -2.25, 3.125]).with_sigma(vec![0.1, 0.2, 0.3]);
        write_dataset(&path, &data).unwrap();

        let back = load_dataset(&path).unwrap();
        assert_eq!(back.data, data);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn report_json_writes_infinity_as_null() {
        let path = temp_path("report.json");
        let scores = InformationCriteria {
            aic: 1.5,
            aicc: f64::INFINITY,
        };
        write_report_json(&path, &scores).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["aic"], serde_json::json!(1.5));
        assert!(value["aicc"].is_null());
        let _ = std::fs::remove_file(&path);
    }
}
