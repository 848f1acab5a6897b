//! Autocorrelation (ACF) and moving autocorrelation (MACF) of returns or prices.

use super::{SeriesSource, WindowSpec, generator_identity};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::rolling::{autocorrelation, rolling_autocorr};
use crate::domain::series::Frame;

pub const KIND: &str = "AutoCorrelation";
pub const MACF_KIND: &str = "MACF";

pub fn defaults() -> Options {
    option_map([
        ("lags", OptionValue::Int(30)),
        ("series", OptionValue::Text("returns".into())),
    ])
}

pub fn macf_defaults() -> Options {
    option_map([
        ("lag", OptionValue::Int(1)),
        ("window", OptionValue::Int(14)),
        ("offset", OptionValue::Null),
        ("series", OptionValue::Text("returns".into())),
    ])
}

#[derive(Debug)]
pub struct AutoCorrelationGenerator {
    name: String,
    options: Options,
    lags: usize,
    source: SeriesSource,
}

impl AutoCorrelationGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);
        let lags = reader.count("lags")?;
        let source = SeriesSource::read(&reader, "series", &name)?;
        Ok(Self {
            name,
            options,
            lags,
            source,
        })
    }
}

impl InsightGenerator for AutoCorrelationGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let series = self.source.resolve(derivative)?;
        let mut acf = autocorrelation(&series.values())?;
        acf.truncate(self.lags + 1);
        Ok(Insight::Correlogram(acf))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(AutoCorrelationGenerator::new(name, &overrides)?))
}

#[derive(Debug)]
pub struct MacfGenerator {
    name: String,
    options: Options,
    lag: usize,
    window: WindowSpec,
    source: SeriesSource,
}

impl MacfGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, macf_defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);
        let lag = reader.count("lag")?;
        let window = WindowSpec::read(&reader)?;
        let source = SeriesSource::read(&reader, "series", &name)?;
        Ok(Self {
            name,
            options,
            lag,
            window,
            source,
        })
    }
}

impl InsightGenerator for MacfGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        MACF_KIND
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let series = self.source.resolve(derivative)?;
        let mut frame = Frame::new(series.dates());
        frame.push_column(
            "MACF",
            rolling_autocorr(
                &series.values(),
                self.lag,
                self.window.window,
                self.window.offset,
            ),
        )?;
        Ok(Insight::Frame(frame))
    }
}

pub fn create_macf(
    name: String,
    overrides: Options,
) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(MacfGenerator::new(name, &overrides)?))
}
