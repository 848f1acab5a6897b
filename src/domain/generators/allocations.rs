//! Weight of each underlying per date.

use super::generator_identity;
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::options::{Options, resolve_options};
use crate::domain::series::{Frame, TimeSeries};

pub const KIND: &str = "UnderlyingAllocations";

pub fn defaults() -> Options {
    Options::new()
}

#[derive(Debug)]
pub struct UnderlyingAllocationsGenerator {
    name: String,
    options: Options,
}

impl UnderlyingAllocationsGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        Ok(Self { name, options })
    }
}

impl InsightGenerator for UnderlyingAllocationsGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let mut frame = Frame::new(derivative.values().iter().map(|b| b.date).collect());
        for asset in derivative.assets() {
            let name = asset.name();
            match derivative.weights().get(name) {
                Some(weights) => frame.push_series(weights)?,
                None => frame.push_series(&TimeSeries::new(name, Vec::new()))?,
            }
        }
        Ok(Insight::Frame(frame))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(UnderlyingAllocationsGenerator::new(name, &overrides)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generators::testing::{asset, date, derivative};
    use crate::domain::options::{OptionValue, option_map};

    #[test]
    fn one_column_per_underlying_in_order() {
        let spy = asset("SPY", &[0.01, 0.02]);
        let tlt = asset("TLT", &[0.0, 0.01]);
        let strat = derivative(&[0.01, 0.015], &[spy, tlt])
            .with_underlying("TLT", TimeSeries::from_pairs("w", [(date(0), 0.4), (date(1), 0.5)]))
            .unwrap()
            .with_underlying("SPY", TimeSeries::from_pairs("w", [(date(1), 0.5)]))
            .unwrap();

        let generator = UnderlyingAllocationsGenerator::new("alloc", &Options::new()).unwrap();
        let insight = generator.generate(&strat).unwrap();
        let frame = insight.as_frame().unwrap();

        assert_eq!(frame.columns[0].name, "TLT");
        assert_eq!(frame.columns[0].values, vec![Some(0.4), Some(0.5)]);
        assert_eq!(frame.columns[1].values, vec![None, Some(0.5)]);
    }

    #[test]
    fn takes_no_options() {
        let overrides = option_map([("window", OptionValue::Int(3))]);
        assert!(UnderlyingAllocationsGenerator::new("alloc", &overrides).is_err());
    }
}
