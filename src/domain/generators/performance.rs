//! Headline performance and risk statistics of the derivative.

use super::generator_identity;
use crate::domain::error::InsightError;
use crate::domain::generator::InsightGenerator;
use crate::domain::insight::Insight;
use crate::domain::instrument::DerivativeView;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::options::{OptionReader, OptionValue, Options, option_map, resolve_options};
use crate::domain::returns::period_returns;

pub const KIND: &str = "PerfSummary";

pub fn defaults() -> Options {
    option_map([("risk_free_rate", OptionValue::Float(0.0))])
}

#[derive(Debug)]
pub struct PerfSummaryGenerator {
    name: String,
    options: Options,
    risk_free_rate: f64,
}

impl PerfSummaryGenerator {
    pub fn new(name: impl Into<String>, overrides: &Options) -> Result<Self, InsightError> {
        let name = name.into();
        let options = resolve_options(&name, defaults(), overrides)?;
        let risk_free_rate = OptionReader::new(&name, &options).float("risk_free_rate")?;
        Ok(Self {
            name,
            options,
            risk_free_rate,
        })
    }
}

impl InsightGenerator for PerfSummaryGenerator {
    generator_identity!();

    fn generate(&self, derivative: &dyn DerivativeView) -> Result<Insight, InsightError> {
        let returns = period_returns(derivative.returns())?;
        let s = PerformanceSummary::compute(&returns, self.risk_free_rate)?;
        Ok(Insight::Scalars(vec![
            ("Periods".into(), s.periods as f64),
            ("Traded Periods".into(), s.traded_periods as f64),
            ("Total Return".into(), s.total_return),
            ("Annualized Return".into(), s.annualized_return),
            ("Annualized Volatility".into(), s.annualized_volatility),
            ("Sharpe Ratio".into(), s.sharpe_ratio),
            ("Sortino Ratio".into(), s.sortino_ratio),
            ("Max Drawdown".into(), s.max_drawdown),
            ("Max Drawdown Duration".into(), s.max_drawdown_duration as f64),
            ("Win Rate".into(), s.win_rate),
            ("Best Period".into(), s.best_period),
            ("Worst Period".into(), s.worst_period),
        ]))
    }
}

pub fn create(name: String, overrides: Options) -> Result<Box<dyn InsightGenerator>, InsightError> {
    Ok(Box::new(PerfSummaryGenerator::new(name, &overrides)?))
}
