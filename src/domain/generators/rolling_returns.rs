//! Rolling dispersion and autocorrelation of period returns.

use super::{WindowSpec, generator_identity};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::returns::period_returns;
use crate::domain::rolling::{autocorrelation, rolling_autocorr, rolling_std, rolling_var};
use crate::domain::series::Frame;

pub const KIND: &str = "RollingReturns";

fn window_defaults() -> OptionValue {
    OptionValue::Map(option_map([
        ("window", OptionValue::Int(14)),
        ("offset", OptionValue::Null),
    ]))
}

pub fn defaults() -> Options {
    option_map([
        ("std", window_defaults()),
        (
            "macf",
            OptionValue::Map(option_map([
                ("lag", OptionValue::Int(1)),
                ("window", OptionValue::Int(14)),
                ("offset", OptionValue::Null),
            ])),
        ),
    ])
}

#[derive(Debug)]
pub struct RollingReturnsGenerator {
    name: String,
    options: Options,
    std: WindowSpec,
    macf: WindowSpec,
    macf_lag: usize,
}

impl RollingReturnsGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);
        let std = WindowSpec::read(&reader.nested("std")?)?;
        let macf_reader = reader.nested("macf")?;
        let macf = WindowSpec::read(&macf_reader)?;
        let macf_lag = macf_reader.count("lag")?;
        Ok(Self {
            name,
            options,
            std,
            macf,
            macf_lag,
        })
    }
}

impl InsightGenerator for RollingReturnsGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let period = period_returns(derivative.returns())?;
        let values = period.values();

        let mut frame = Frame::new(period.dates());
        frame.push_series(&period)?;
        frame.push_column("Std", rolling_std(&values, self.std.window, self.std.offset))?;
        frame.push_column("Var", rolling_var(&values, self.std.window, self.std.offset))?;
        let acf = if values.is_empty() {
            Vec::new()
        } else {
            autocorrelation(&values)?.into_iter().map(Some).collect()
        };
        frame.push_column("AutoCorr", acf)?;
        frame.push_column(
            "MACF",
            rolling_autocorr(&values, self.macf_lag, self.macf.window, self.macf.offset),
        )?;
        Ok(Insight::Frame(frame))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(RollingReturnsGenerator::new(name, &overrides)?))
}
