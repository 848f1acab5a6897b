//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<NAME>.csv`, with header
//! `date,open,high,low,close,<session return columns...>`.

use crate::domain::error::InsightError;
use crate::domain::instrument::PriceHistory;
use crate::domain::ohlcv::OhlcBar;
use crate::domain::returns::ReturnsTable;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const PRICE_COLUMNS: usize = 5;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", name))
    }
}

fn data_error(reason: impl Into<String>) -> InsightError {
    InsightError::Data {
        reason: reason.into(),
    }
}

fn parse_field(record: &csv::StringRecord, idx: usize, column: &str) -> Result<f64, InsightError> {
    record
        .get(idx)
        .ok_or_else(|| data_error(format!("missing {} column", column)))?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("invalid {} value: {}", column, e)))
}

impl DataPort for CsvAdapter {
    fn load(&self, name: &str) -> Result<PriceHistory, InsightError> {
        let path = self.csv_path(name);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();
        let fields: Vec<String> = headers
            .iter()
            .skip(PRICE_COLUMNS)
            .map(|h| h.trim().to_string())
            .collect();
        if fields.is_empty() {
            return Err(data_error(format!(
                "{} has no return columns after date,open,high,low,close",
                path.display()
            )));
        }

        let mut rows: Vec<(OhlcBar, Vec<f64>)> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| data_error("missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| data_error(format!("invalid date format: {}", e)))?;

            let bar = OhlcBar {
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
            };
            let returns = fields
                .iter()
                .enumerate()
                .map(|(i, field)| parse_field(&record, PRICE_COLUMNS + i, field))
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push((bar, returns));
        }

        rows.sort_by_key(|(bar, _)| bar.date);

        let mut table = ReturnsTable::new(fields);
        let mut values = Vec::with_capacity(rows.len());
        for (bar, returns) in rows {
            table.push(bar.date, returns)?;
            values.push(bar);
        }

        tracing::debug!(instrument = name, rows = values.len(), "loaded price history");
        Ok(PriceHistory {
            values,
            returns: table,
        })
    }

    fn list_instruments(&self) -> Result<Vec<String>, InsightError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,Open,Close\n\
            2024-01-16,105.0,115.0,100.0,110.0,0.0,0.047619\n\
            2024-01-15,100.0,110.0,90.0,105.0,0.01,0.05\n";

        fs::write(path.join("SPY.csv"), csv_content).unwrap();
        fs::write(path.join("TLT.csv"), "date,open,high,low,close,Close\n").unwrap();
        fs::write(path.join("notes.txt"), "not data").unwrap();

        (dir, path)
    }

    #[test]
    fn load_returns_sorted_bars_and_sessions() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let history = adapter.load("SPY").unwrap();
        assert_eq!(history.values.len(), 2);
        assert_eq!(
            history.values[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(history.values[0].close, 105.0);
        assert_eq!(history.returns.fields, vec!["Open", "Close"]);
        assert_eq!(history.returns.rows[0].values, vec![0.01, 0.05]);
    }

    #[test]
    fn load_empty_file_gives_empty_history() {
        let (_dir, path) = setup_test_data();
        let history = CsvAdapter::new(path).load("TLT").unwrap();
        assert!(history.values.is_empty());
        assert!(history.returns.is_empty());
    }

    #[test]
    fn load_missing_file_is_a_data_error() {
        let (_dir, path) = setup_test_data();
        assert!(matches!(
            CsvAdapter::new(path).load("GLD"),
            Err(InsightError::Data { .. })
        ));
    }

    #[test]
    fn load_requires_return_columns() {
        let (_dir, path) = setup_test_data();
        fs::write(path.join("BAD.csv"), "date,open,high,low,close\n").unwrap();
        assert!(CsvAdapter::new(path).load("BAD").is_err());
    }

    #[test]
    fn load_rejects_bad_number() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,Close\n2024-01-15,1,1,1,abc,0.0\n",
        )
        .unwrap();
        assert!(CsvAdapter::new(path).load("BAD").is_err());
    }

    #[test]
    fn load_rejects_repeated_date() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("DUP.csv"),
            "date,open,high,low,close,Close\n\
             2024-01-15,1,1,1,1,0.0\n\
             2024-01-15,1,1,1,1,0.0\n",
        )
        .unwrap();
        assert!(matches!(
            CsvAdapter::new(path).load("DUP"),
            Err(InsightError::Data { .. })
        ));
    }

    #[test]
    fn list_instruments_only_csv_stems() {
        let (_dir, path) = setup_test_data();
        let names = CsvAdapter::new(path).list_instruments().unwrap();
        assert_eq!(names, vec!["SPY", "TLT"]);
    }
}
