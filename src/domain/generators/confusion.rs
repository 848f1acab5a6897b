//! Sign-corrected confusion matrix of predictions against a baseline.

use super::{ActualSource, generator_identity, predictions_or_returns};
use crate::domain::classification::{ClassificationConfig, Normalize, evaluate};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::series::TimeSeries;

pub const KIND: &str = "ConfusionMatrix";

pub fn defaults() -> Options {
    option_map([
        ("baseline", OptionValue::Null),
        ("actual", OptionValue::Null),
        ("predictions", OptionValue::Null),
        ("no_hold", OptionValue::Bool(false)),
        ("normalize", OptionValue::Null),
        ("returns_data", OptionValue::Bool(true)),
    ])
}

#[derive(Debug)]
pub struct ConfusionMatrixGenerator {
    name: String,
    options: Options,
    actual: ActualSource,
    predictions: Option<TimeSeries>,
    config: ClassificationConfig,
}

impl ConfusionMatrixGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);

        let actual = ActualSource::read(&reader, &name)?;
        let predictions = reader.series("predictions")?.cloned();
        let normalize = match reader.text("normalize")? {
            Some(raw) => Some(
                raw.parse::<Normalize>()
                    .map_err(|e| InsightError::configuration(&name, "normalize", e))?,
            ),
            None => None,
        };

        // Derived return series always need sign correction.
        let derived = predictions.is_none() || matches!(actual, ActualSource::Baseline(_));
        let config = ClassificationConfig {
            no_hold: reader.bool("no_hold")?,
            normalize,
            returns_data: reader.bool("returns_data")? || derived,
        };

        Ok(Self {
            name,
            options,
            actual,
            predictions,
            config,
        })
    }
}

impl InsightGenerator for ConfusionMatrixGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let predicted = predictions_or_returns(self.predictions.as_ref(), derivative)?;
        let actual = self.actual.resolve()?;
        let report = evaluate(&actual, &predicted, &self.config)?;
        Ok(Insight::Classification(report))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(ConfusionMatrixGenerator::new(name, &overrides)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::Signal;
    use crate::domain::generators::testing::{asset, date, derivative};

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_pairs("s", values.iter().enumerate().map(|(i, v)| (date(i), *v)))
    }

    #[test]
    fn missing_baseline_fails_at_construction() {
        let err = ConfusionMatrixGenerator::new("cm", &Options::new()).unwrap_err();
        assert!(matches!(err, InsightError::Configuration { ref option, .. } if option == "baseline"));
    }

    #[test]
    fn bad_normalize_is_rejected() {
        let overrides = option_map([
            ("actual", OptionValue::Series(series(&[0.01]))),
            ("normalize", OptionValue::Text("rows".into())),
        ]);
        assert!(ConfusionMatrixGenerator::new("cm", &overrides).is_err());
    }

    #[test]
    fn unsorted_predictions_fail_at_construction() {
        let mut predictions = series(&[0.01, -0.02, 0.03]);
        predictions.points.reverse();
        let overrides = option_map([
            ("actual", OptionValue::Series(series(&[0.02, 0.01, -0.01]))),
            ("predictions", OptionValue::Series(predictions)),
        ]);
        let err = ConfusionMatrixGenerator::new("cm", &overrides).unwrap_err();
        assert!(matches!(err, InsightError::Configuration { ref option, .. } if option == "predictions"));
    }

    #[test]
    fn baseline_vs_derivative_returns() {
        let spy = asset("SPY", &[-0.02, 0.03, 0.01]);
        let strat = derivative(&[0.01, 0.02, -0.01], &[spy.clone()]);
        let overrides = option_map([("baseline", OptionValue::Instrument(spy))]);
        let generator = ConfusionMatrixGenerator::new("cm", &overrides).unwrap();

        let insight = generator.produce(&strat, false).unwrap();
        let report = insight.as_classification().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.actual, vec![Signal::Sell, Signal::Buy, Signal::Buy]);
        assert_eq!(report.predicted, vec![Signal::Sell, Signal::Buy, Signal::Sell]);
        assert_eq!(report.wins, 2);
    }

    #[test]
    fn explicit_directional_series_skip_correction() {
        let overrides = option_map([
            ("actual", OptionValue::Series(series(&[-1.0, 1.0]))),
            ("predictions", OptionValue::Series(series(&[1.0, 1.0]))),
            ("returns_data", OptionValue::Bool(false)),
        ]);
        let generator = ConfusionMatrixGenerator::new("cm", &overrides).unwrap();
        let strat = derivative(&[0.0, 0.0], &[]);
        let insight = generator.generate(&strat).unwrap();
        assert_eq!(insight.as_classification().unwrap().wins, 1);
    }

    #[test]
    fn produce_is_repeatable() {
        let spy = asset("SPY", &[0.01, -0.01, 0.02]);
        let strat = derivative(&[0.02, 0.01, -0.01], &[]);
        let overrides = option_map([("baseline", OptionValue::Instrument(spy))]);
        let generator = ConfusionMatrixGenerator::new("cm", &overrides).unwrap();
        assert_eq!(
            generator.produce(&strat, false).unwrap(),
            generator.produce(&strat, false).unwrap()
        );
    }
}
