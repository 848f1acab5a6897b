#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tradeinsight::domain::error::InsightError;
use tradeinsight::domain::instrument::PriceHistory;
pub use tradeinsight::domain::ohlcv::OhlcBar;
use tradeinsight::domain::returns::ReturnsTable;
use tradeinsight::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: BTreeMap<String, PriceHistory>,
    pub errors: BTreeMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_returns(mut self, name: &str, returns: &[f64]) -> Self {
        self.data.insert(name.to_string(), make_history(returns));
        self
    }

    /// Stored history for `name`; panics when absent.
    pub fn load_history(&self, name: &str) -> PriceHistory {
        self.data[name].clone()
    }

    pub fn with_error(mut self, name: &str, reason: &str) -> Self {
        self.errors.insert(name.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load(&self, name: &str) -> Result<PriceHistory, InsightError> {
        if let Some(reason) = self.errors.get(name) {
            return Err(InsightError::Data {
                reason: reason.clone(),
            });
        }
        self.data.get(name).cloned().ok_or_else(|| InsightError::Data {
            reason: format!("no data for {name}"),
        })
    }

    fn list_instruments(&self) -> Result<Vec<String>, InsightError> {
        let names: BTreeSet<&String> = self.data.keys().chain(self.errors.keys()).collect();
        Ok(names.into_iter().cloned().collect())
    }
}

pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

/// Single `Close` session history compounding `returns` from 100.
pub fn make_history(returns: &[f64]) -> PriceHistory {
    let mut table = ReturnsTable::new(vec!["Close".to_string()]);
    let mut values = Vec::with_capacity(returns.len());
    let mut close = 100.0;
    for (i, r) in returns.iter().enumerate() {
        let open = close;
        close *= 1.0 + r;
        values.push(OhlcBar {
            date: day(i),
            open,
            high: open.max(close) * 1.005,
            low: open.min(close) * 0.995,
            close,
        });
        table.push(day(i), vec![*r]).unwrap();
    }
    PriceHistory {
        values,
        returns: table,
    }
}

/// Deterministic wavy returns, never constant.
pub fn wave(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 0.01 * ((i as f64) * 0.7 + phase).sin() + 0.0005 * (i % 3) as f64)
        .collect()
}

/// CSV text for [`make_history`] in the on-disk layout.
pub fn history_csv(returns: &[f64]) -> String {
    let history = make_history(returns);
    let mut out = String::from("date,open,high,low,close,Close\n");
    for (bar, row) in history.values.iter().zip(&history.returns.rows) {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, row.values[0]
        ));
    }
    out
}
