//! Period returns with a trailing moving average.

use super::{WindowSpec, generator_identity};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::returns::period_returns;
use crate::domain::rolling::rolling_mean;
use crate::domain::series::Frame;

pub const KIND: &str = "ReturnsSeries";

pub fn defaults() -> Options {
    option_map([(
        "ma",
        OptionValue::Map(option_map([
            ("window", OptionValue::Int(20)),
            ("offset", OptionValue::Int(0)),
        ])),
    )])
}

#[derive(Debug)]
pub struct ReturnsSeriesGenerator {
    name: String,
    options: Options,
    ma: WindowSpec,
}

impl ReturnsSeriesGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let ma = WindowSpec::read(&OptionReader::new(&name, &options).nested("ma")?)?;
        Ok(Self { name, options, ma })
    }
}

impl InsightGenerator for ReturnsSeriesGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let period = period_returns(derivative.returns())?;
        let mut frame = Frame::new(period.dates());
        frame.push_series(&period)?;
        frame.push_column(
            "MA",
            rolling_mean(&period.values(), self.ma.window, self.ma.offset),
        )?;
        Ok(Insight::Frame(frame))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(ReturnsSeriesGenerator::new(name, &overrides)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generators::testing::derivative;
    use approx::assert_abs_diff_eq;

    #[test]
    fn moving_average_trails_returns() {
        let overrides = option_map([(
            "ma",
            OptionValue::Map(option_map([("window", OptionValue::Int(2))])),
        )]);
        let generator = ReturnsSeriesGenerator::new("rs", &overrides).unwrap();
        let insight = generator
            .generate(&derivative(&[0.01, 0.03, -0.02], &[]))
            .unwrap();
        let ma = &insight.as_frame().unwrap().column("MA").unwrap().values;
        assert!(ma[0].is_none());
        assert_abs_diff_eq!(ma[1].unwrap(), 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(ma[2].unwrap(), 0.005, epsilon = 1e-12);
    }

    #[test]
    fn zero_window_is_rejected() {
        let overrides = option_map([(
            "ma",
            OptionValue::Map(option_map([("window", OptionValue::Int(0))])),
        )]);
        assert!(ReturnsSeriesGenerator::new("rs", &overrides).is_err());
    }
}
