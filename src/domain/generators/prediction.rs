//! Regression metrics of predictions against actual values.

use super::{ActualSource, generator_identity, predictions_or_returns};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::metrics::PredictionMetrics;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::series::TimeSeries;

pub const KIND: &str = "PredictionMetrics";

pub fn defaults() -> Options {
    option_map([
        ("baseline", OptionValue::Null),
        ("actual", OptionValue::Null),
        ("predictions", OptionValue::Null),
    ])
}

#[derive(Debug)]
pub struct PredictionMetricsGenerator {
    name: String,
    options: Options,
    actual: ActualSource,
    predictions: Option<TimeSeries>,
}

impl PredictionMetricsGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);
        let actual = ActualSource::read(&reader, &name)?;
        let predictions = reader.series("predictions")?.cloned();
        Ok(Self {
            name,
            options,
            actual,
            predictions,
        })
    }
}

impl InsightGenerator for PredictionMetricsGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let predicted = predictions_or_returns(self.predictions.as_ref(), derivative)?;
        let actual = self.actual.resolve()?;
        let m = PredictionMetrics::compute(&actual, &predicted)?;
        Ok(Insight::Scalars(vec![
            ("Mean Forecast Error (MFE)".into(), m.mfe),
            ("Mean Absolute Error (MAE)".into(), m.mae),
            ("Max. Error".into(), m.max_error),
            ("Residual Standard Error (RSE)".into(), m.rse),
            ("Mean Absolute Percentage Error (MAPE)".into(), m.mape),
            ("Mean Absolute Scaled Error (MASE)".into(), m.mase),
            ("Mean Squared Error (MSE)".into(), m.mse),
            ("R-Squared".into(), m.r2),
            ("Mean Directional Accuracy (MDA) %".into(), m.mda),
            ("Mean Sign Accuracy (MSA) %".into(), m.msa),
        ]))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(PredictionMetricsGenerator::new(name, &overrides)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generators::testing::{asset, date, derivative};
    use approx::assert_abs_diff_eq;

    #[test]
    fn requires_actual_or_baseline() {
        assert!(PredictionMetricsGenerator::new("pm", &Options::new()).is_err());
    }

    #[test]
    fn derivative_tracking_baseline_exactly() {
        let spy = asset("SPY", &[0.01, -0.02, 0.015, 0.005]);
        let strat = derivative(&[0.01, -0.02, 0.015, 0.005], &[]);
        let overrides = option_map([("baseline", OptionValue::Instrument(spy))]);
        let insight = PredictionMetricsGenerator::new("pm", &overrides)
            .unwrap()
            .generate(&strat)
            .unwrap();

        assert_abs_diff_eq!(insight.scalar("Mean Absolute Error (MAE)").unwrap(), 0.0);
        assert_abs_diff_eq!(insight.scalar("R-Squared").unwrap(), 1.0);
        assert_abs_diff_eq!(insight.scalar("Mean Sign Accuracy (MSA) %").unwrap(), 100.0);
    }

    #[test]
    fn explicit_actual_and_predictions() {
        let actual = TimeSeries::from_pairs("y", (0..3).map(|i| (date(i), i as f64)));
        let predicted = TimeSeries::from_pairs("yhat", (0..3).map(|i| (date(i), i as f64 + 1.0)));
        let overrides = option_map([
            ("actual", OptionValue::Series(actual)),
            ("predictions", OptionValue::Series(predicted)),
        ]);
        let strat = derivative(&[0.0], &[]);
        let insight = PredictionMetricsGenerator::new("pm", &overrides)
            .unwrap()
            .generate(&strat)
            .unwrap();
        assert_abs_diff_eq!(insight.scalar("Mean Forecast Error (MFE)").unwrap(), -1.0);
        assert_abs_diff_eq!(insight.scalar("Max. Error").unwrap(), 1.0);
    }
}
