//! Return tables and the period / log / traded return derivations.
//!
//! A `ReturnsTable` holds one column per trading-session field (for example
//! `Open` and `Close`). The period return of a row compounds its session
//! returns: `prod(1 + r_session) - 1`. A single-column table passes through.

use crate::domain::error::InsightError;
use crate::domain::series::{SeriesPoint, TimeSeries};
use chrono::NaiveDate;

pub const PERIOD_FIELD: &str = "period";

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsRow {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnsTable {
    pub fields: Vec<String>,
    pub rows: Vec<ReturnsRow>,
}

impl ReturnsTable {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    /// Single-column table holding an already-derived period series.
    pub fn from_period(series: &TimeSeries) -> Self {
        Self {
            fields: vec![PERIOD_FIELD.to_string()],
            rows: series
                .points
                .iter()
                .map(|p| ReturnsRow {
                    date: p.date,
                    values: vec![p.value],
                })
                .collect(),
        }
    }

    pub fn push(&mut self, date: NaiveDate, values: Vec<f64>) -> Result<(), InsightError> {
        if values.len() != self.fields.len() {
            return Err(InsightError::Data {
                reason: format!(
                    "returns row for {} has {} values, expected {}",
                    date,
                    values.len(),
                    self.fields.len()
                ),
            });
        }
        if let Some(last) = self.rows.last() {
            if last.date >= date {
                return Err(InsightError::Data {
                    reason: format!("returns row for {} follows {}", date, last.date),
                });
            }
        }
        self.rows.push(ReturnsRow { date, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, field: &str) -> Option<TimeSeries> {
        let idx = self.fields.iter().position(|f| f == field)?;
        Some(TimeSeries::from_pairs(
            field,
            self.rows.iter().map(|r| (r.date, r.values[idx])),
        ))
    }
}

fn compound(values: &[f64]) -> f64 {
    match values {
        [single] => *single,
        many => many.iter().map(|r| 1.0 + r).product::<f64>() - 1.0,
    }
}

/// Simple returns for the canonical period.
pub fn period_returns(returns: &ReturnsTable) -> Result<TimeSeries, InsightError> {
    if returns.fields.is_empty() && !returns.rows.is_empty() {
        return Err(InsightError::computation(
            "returns table has rows but no session columns",
        ));
    }

    let mut points = Vec::with_capacity(returns.rows.len());
    for row in &returns.rows {
        if let Some(bad) = row.values.iter().find(|v| !v.is_finite()) {
            return Err(InsightError::NonNumeric {
                date: row.date,
                value: *bad,
            });
        }
        points.push(SeriesPoint {
            date: row.date,
            value: compound(&row.values),
        });
    }

    Ok(TimeSeries::new(PERIOD_FIELD, points))
}

/// `ln(1 + r)` for the canonical period.
pub fn period_log_returns(returns: &ReturnsTable) -> Result<TimeSeries, InsightError> {
    log_returns(&period_returns(returns)?)
}

/// `ln(1 + r)` elementwise. A return at or below -100% has no log return.
pub fn log_returns(series: &TimeSeries) -> Result<TimeSeries, InsightError> {
    series.ensure_numeric()?;
    let mut points = Vec::with_capacity(series.len());
    for p in &series.points {
        if p.value <= -1.0 {
            return Err(InsightError::computation(format!(
                "return {} at {} has no log return",
                p.value, p.date
            )));
        }
        points.push(SeriesPoint {
            date: p.date,
            value: p.value.ln_1p(),
        });
    }
    Ok(TimeSeries::new(series.name.clone(), points))
}

/// Periods with a non-zero return; a zero return means no position was held.
pub fn traded_returns(period_returns: &TimeSeries) -> Result<TimeSeries, InsightError> {
    period_returns.ensure_numeric()?;
    Ok(period_returns.filter(|p| p.value != 0.0))
}
