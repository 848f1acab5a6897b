//! Date-indexed series and frames.
//!
//! - `TimeSeries`: one named column of values keyed by date
//! - `Frame`: several optional-valued columns sharing one date index

use crate::domain::error::InsightError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn from_pairs<I>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let points = pairs
            .into_iter()
            .map(|(date, value)| SeriesPoint { date, value })
            .collect();
        Self::new(name, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Value at `date`. Dates must be strictly increasing, see [`Self::ensure_sorted`].
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn filter<F>(&self, mut keep: F) -> TimeSeries
    where
        F: FnMut(&SeriesPoint) -> bool,
    {
        TimeSeries::new(
            self.name.clone(),
            self.points.iter().filter(|p| keep(p)).copied().collect(),
        )
    }

    /// Fails unless dates are strictly increasing (sorted, no duplicates).
    pub fn ensure_sorted(&self) -> Result<(), InsightError> {
        match self.points.windows(2).find(|w| w[0].date >= w[1].date) {
            Some(w) => Err(InsightError::computation(format!(
                "series `{}` is not in date order: {} then {}",
                self.name, w[0].date, w[1].date
            ))),
            None => Ok(()),
        }
    }

    /// Fails on the first NaN or infinite value.
    pub fn ensure_numeric(&self) -> Result<(), InsightError> {
        match self.points.iter().find(|p| !p.value.is_finite()) {
            Some(p) => Err(InsightError::NonNumeric {
                date: p.date,
                value: p.value,
            }),
            None => Ok(()),
        }
    }
}

/// Values of two series that must share an identical date index.
pub fn aligned_values(
    left: &TimeSeries,
    right: &TimeSeries,
) -> Result<(Vec<f64>, Vec<f64>), InsightError> {
    if left.len() != right.len() {
        return Err(InsightError::computation(format!(
            "series `{}` has {} periods but `{}` has {}",
            left.name,
            left.len(),
            right.name,
            right.len()
        )));
    }
    if let Some((l, r)) = left
        .points
        .iter()
        .zip(&right.points)
        .find(|(l, r)| l.date != r.date)
    {
        return Err(InsightError::computation(format!(
            "series `{}` and `{}` are not aligned: {} vs {}",
            left.name, right.name, l.date, r.date
        )));
    }
    Ok((left.values(), right.values()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl Frame {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), InsightError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(InsightError::computation(format!(
                "column `{}` has {} rows, frame has {}",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    pub fn push_series(&mut self, series: &TimeSeries) -> Result<(), InsightError> {
        series.ensure_sorted()?;
        let values = self.dates.iter().map(|d| series.get(*d)).collect();
        self.push_column(series.name.clone(), values)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }
}
