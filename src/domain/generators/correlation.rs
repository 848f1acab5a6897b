//! Pairwise correlation of log returns across the derivative and its universe.

use super::{generator_identity, log_returns_of};
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::{Insight, LabeledMatrix};
use crate::domain::instrument::{DerivativeView, Instrument};
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::rolling::pearson;
use crate::domain::series::TimeSeries;
use chrono::NaiveDate;
use std::sync::Arc;

pub const KIND: &str = "CorrelationMatrix";
pub const BASELINE_LABEL: &str = "Baseline";

pub fn defaults() -> Options {
    option_map([
        ("baseline", OptionValue::Null),
        ("asset_list", OptionValue::List(Vec::new())),
    ])
}

#[derive(Debug)]
pub struct CorrelationMatrixGenerator {
    name: String,
    options: Options,
    baseline: Option<Arc<Instrument>>,
    asset_list: Vec<String>,
}

impl CorrelationMatrixGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let reader = OptionReader::new(&name, &options);
        let baseline = reader.instrument("baseline")?;
        let asset_list = reader.list("asset_list")?;
        Ok(Self {
            name,
            options,
            baseline,
            asset_list,
        })
    }

    fn columns(&self, derivative: &dyn DerivativeView) -> Result<Vec<TimeSeries>, InsightError> {
        let mut columns = vec![log_returns_of(derivative)?];
        if let Some(baseline) = &self.baseline {
            columns.push(log_returns_of(baseline.as_ref())?.renamed(BASELINE_LABEL));
        }

        match (derivative.env(), self.asset_list.is_empty()) {
            (Some(env), false) => {
                for asset in &self.asset_list {
                    columns.push(log_returns_of(env.find_asset(asset)?.as_ref())?);
                }
            }
            (Some(env), true) => {
                for asset in env.asset_store().iter() {
                    columns.push(log_returns_of(asset.as_ref())?);
                }
            }
            (None, false) => {
                return Err(InsightError::computation(format!(
                    "`{}` has no environment to look up assets in",
                    derivative.name()
                )));
            }
            (None, true) => {}
        }
        Ok(columns)
    }
}

/// Correlation over the dates where both series have a value.
fn paired_correlation(index: &[NaiveDate], a: &TimeSeries, b: &TimeSeries) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = index
        .iter()
        .filter_map(|d| Some((a.get(*d)?, b.get(*d)?)))
        .unzip();
    pearson(&xs, &ys)
}

impl InsightGenerator for CorrelationMatrixGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let columns = self.columns(derivative)?;
        let index = columns[0].dates();

        let values = columns
            .iter()
            .map(|a| {
                columns
                    .iter()
                    .map(|b| paired_correlation(&index, a, b))
                    .collect()
            })
            .collect();

        Ok(Insight::Matrix(LabeledMatrix {
            labels: columns.iter().map(|c| c.name.clone()).collect(),
            values,
        }))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(CorrelationMatrixGenerator::new(name, &overrides)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generators::testing::{asset, derivative};
    use approx::assert_abs_diff_eq;

    const STRAT: [f64; 4] = [0.01, -0.02, 0.03, -0.01];

    #[test]
    fn whole_store_by_default() {
        let spy = asset("SPY", &STRAT);
        let tlt = asset("TLT", &[-0.01, 0.02, -0.03, 0.01]);
        let generator = CorrelationMatrixGenerator::new("corr", &Options::new()).unwrap();
        let insight = generator
            .generate(&derivative(&STRAT, &[spy, tlt]))
            .unwrap();
        let m = insight.as_matrix().unwrap();

        assert_eq!(m.labels, vec!["STRAT", "SPY", "TLT"]);
        assert_abs_diff_eq!(m.get("STRAT", "SPY").unwrap(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.get("STRAT", "TLT").unwrap(), -1.0, epsilon = 0.01);
    }

    #[test]
    fn asset_list_and_baseline() {
        let spy = asset("SPY", &STRAT);
        let tlt = asset("TLT", &[0.0, 0.01, 0.0, 0.02]);
        let overrides = option_map([
            ("baseline", OptionValue::Instrument(spy.clone())),
            ("asset_list", OptionValue::List(vec!["TLT".into()])),
        ]);
        let generator = CorrelationMatrixGenerator::new("corr", &overrides).unwrap();
        let insight = generator
            .generate(&derivative(&STRAT, &[spy, tlt]))
            .unwrap();
        assert_eq!(
            insight.as_matrix().unwrap().labels,
            vec!["STRAT", BASELINE_LABEL, "TLT"]
        );
    }

    #[test]
    fn unknown_listed_asset_fails() {
        let overrides = option_map([("asset_list", OptionValue::List(vec!["GLD".into()]))]);
        let generator = CorrelationMatrixGenerator::new("corr", &overrides).unwrap();
        assert!(matches!(
            generator.generate(&derivative(&STRAT, &[])),
            Err(InsightError::UnknownAsset { .. })
        ));
    }
}
