//! Built-in insight generators.
//!
//! Each module exposes `KIND`, a `defaults()` option map built fresh per
//! call, and a `create` factory matching [`GeneratorFactory`](crate::domain::registry::GeneratorFactory).

pub mod allocations;
pub mod autocorrelation;
pub mod confusion;
pub mod correlation;
pub mod performance;
pub mod prediction;
pub mod returns_series;
pub mod rolling_price;
pub mod rolling_returns;

use crate::domain::error::InsightError;
use crate::domain::instrument::{DerivativeView, Instrument};
use crate::domain::options::{OptionReader, TextOrSeries};
use crate::domain::returns::period_log_returns;
use crate::domain::series::{SeriesPoint, TimeSeries};
use std::sync::Arc;

/// Period log returns of any instrument, named after it.
pub(crate) fn log_returns_of(view: &dyn DerivativeView) -> Result<TimeSeries, InsightError> {
    Ok(period_log_returns(view.returns())?.renamed(view.name()))
}

/// `ln(close)` of every bar.
pub(crate) fn log_prices_of(view: &dyn DerivativeView) -> Result<TimeSeries, InsightError> {
    let mut points = Vec::with_capacity(view.values().len());
    for bar in view.values() {
        if bar.close.is_nan() || bar.close <= 0.0 {
            return Err(InsightError::computation(format!(
                "close {} at {} has no log price",
                bar.close, bar.date
            )));
        }
        points.push(SeriesPoint {
            date: bar.date,
            value: bar.close.ln(),
        });
    }
    Ok(TimeSeries::new(view.name(), points))
}

/// Window length plus alignment offset read from a nested option map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WindowSpec {
    pub window: usize,
    pub offset: usize,
}

impl WindowSpec {
    /// Reads `window` and `offset`; an unset offset centres the window.
    pub fn read(reader: &OptionReader<'_>) -> Result<Self, InsightError> {
        let window = reader.count("window")?;
        let offset = reader.opt_offset("offset")?.unwrap_or(window / 2);
        Ok(Self { window, offset })
    }
}

/// The series an autocorrelation-style generator analyses.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SeriesSource {
    Returns,
    Prices,
    Provided(TimeSeries),
}

impl SeriesSource {
    pub fn read(reader: &OptionReader<'_>, key: &str, generator: &str) -> Result<Self, InsightError> {
        match reader.text_or_series(key)? {
            TextOrSeries::Series(s) => Ok(SeriesSource::Provided(s.clone())),
            TextOrSeries::Text(t) => match t.to_lowercase().as_str() {
                "returns" => Ok(SeriesSource::Returns),
                "prices" => Ok(SeriesSource::Prices),
                other => Err(InsightError::configuration(
                    generator,
                    key,
                    format!("expects returns or prices, got `{other}`"),
                )),
            },
        }
    }

    pub fn resolve(&self, view: &dyn DerivativeView) -> Result<TimeSeries, InsightError> {
        let series = match self {
            SeriesSource::Returns => log_returns_of(view)?,
            SeriesSource::Prices => log_prices_of(view)?,
            SeriesSource::Provided(s) => s.clone(),
        };
        series.ensure_numeric()?;
        Ok(series)
    }
}

/// Reference values compared against predictions.
#[derive(Debug, Clone)]
pub(crate) enum ActualSource {
    Provided(TimeSeries),
    Baseline(Arc<Instrument>),
}

impl ActualSource {
    /// `actual` wins over `baseline`; one of them must be set.
    pub fn read(reader: &OptionReader<'_>, generator: &str) -> Result<Self, InsightError> {
        if let Some(actual) = reader.series("actual")? {
            return Ok(ActualSource::Provided(actual.clone()));
        }
        match reader.instrument("baseline")? {
            Some(baseline) => Ok(ActualSource::Baseline(baseline)),
            None => Err(InsightError::configuration(
                generator,
                "baseline",
                "is required when `actual` is not given",
            )),
        }
    }

    pub fn resolve(&self) -> Result<TimeSeries, InsightError> {
        match self {
            ActualSource::Provided(s) => Ok(s.clone()),
            ActualSource::Baseline(b) => log_returns_of(b.as_ref()),
        }
    }
}

/// Caller-supplied predictions, or the derivative's own log returns.
pub(crate) fn predictions_or_returns(
    provided: Option<&TimeSeries>,
    view: &dyn DerivativeView,
) -> Result<TimeSeries, InsightError> {
    match provided {
        Some(s) => Ok(s.clone()),
        None => log_returns_of(view),
    }
}

/// Boilerplate accessors shared by every generator struct with
/// `name`, `options` fields and a module-level `KIND`.
macro_rules! generator_identity {
    () => {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> &str {
            KIND
        }

        fn options(&self) -> &$crate::domain::options::Options {
            &self.options
        }
    };
}

pub(crate) use generator_identity;
