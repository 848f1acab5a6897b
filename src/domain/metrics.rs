//! Performance and prediction-quality metrics over return series.

use crate::domain::error::InsightError;
use crate::domain::returns::traded_returns;
use crate::domain::series::{TimeSeries, aligned_values};
use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Compounds simple returns into an equity curve starting at 1.0.
pub fn equity_curve(returns: &TimeSeries) -> Vec<EquityPoint> {
    let mut equity = 1.0;
    returns
        .points
        .iter()
        .map(|p| {
            equity *= 1.0 + p.value;
            EquityPoint {
                date: p.date,
                equity,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub periods: usize,
    pub traded_periods: usize,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    /// Share of traded periods with a positive return.
    pub win_rate: f64,
    pub best_period: f64,
    pub worst_period: f64,
}

impl PerformanceSummary {
    /// Summarises a series of simple period returns.
    pub fn compute(returns: &TimeSeries, risk_free_rate: f64) -> Result<Self, InsightError> {
        let traded = traded_returns(returns)?;
        if returns.is_empty() {
            return Err(InsightError::computation(
                "performance summary needs at least one period",
            ));
        }

        let values = returns.values();
        let curve = equity_curve(returns);
        let final_equity = curve.last().map(|p| p.equity).unwrap_or(1.0);
        let total_return = final_equity - 1.0;

        let years = values.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if final_equity > 0.0 {
            final_equity.powf(1.0 / years) - 1.0
        } else {
            -1.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&values, daily_rf);

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let annualized_volatility = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

        let wins = traded.points.iter().filter(|p| p.value > 0.0).count();
        let win_rate = if traded.is_empty() {
            0.0
        } else {
            wins as f64 / traded.len() as f64
        };

        Ok(PerformanceSummary {
            start: returns.points.first().map(|p| p.date),
            end: returns.points.last().map(|p| p.date),
            periods: values.len(),
            traded_periods: traded.len(),
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            win_rate,
            best_period: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            worst_period: values.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

/// Annualised Sharpe and Sortino ratios of per-period returns.
pub fn compute_risk_adjusted(returns: &[f64], daily_rf: f64) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

/// Regression-style quality of a prediction series against actual values.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMetrics {
    /// Mean forecast error, `mean(actual - predicted)`. Shows bias.
    pub mfe: f64,
    pub mae: f64,
    pub mape: f64,
    pub mse: f64,
    pub max_error: f64,
    /// Residual standard error.
    pub rse: f64,
    /// MAE relative to a naive previous-value forecast. Below 1 beats naive.
    pub mase: f64,
    pub r2: f64,
    /// Directional accuracy of predicted moves, percent.
    pub mda: f64,
    /// Sign agreement of predicted and actual values, percent.
    pub msa: f64,
}

impl PredictionMetrics {
    pub fn compute(actual: &TimeSeries, predicted: &TimeSeries) -> Result<Self, InsightError> {
        actual.ensure_numeric()?;
        predicted.ensure_numeric()?;
        let (a, p) = aligned_values(actual, predicted)?;
        if a.is_empty() {
            return Err(InsightError::computation(
                "prediction metrics need at least one period",
            ));
        }

        let n = a.len() as f64;
        let errors: Vec<f64> = a.iter().zip(&p).map(|(a, p)| a - p).collect();

        let mfe = errors.iter().sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let ssr: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ssr / n;
        let max_error = errors.iter().map(|e| e.abs()).fold(0.0, f64::max);
        let mape = a
            .iter()
            .zip(&errors)
            .map(|(a, e)| e.abs() / a.abs().max(f64::EPSILON))
            .sum::<f64>()
            / n;
        let rse = (ssr / (a.len().saturating_sub(2).max(1)) as f64).sqrt();

        let naive_mae = if a.len() > 1 {
            a.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        let mase = if naive_mae > 0.0 {
            mae / naive_mae
        } else {
            f64::NAN
        };

        let mean_actual = a.iter().sum::<f64>() / n;
        let sst: f64 = a.iter().map(|v| (v - mean_actual).powi(2)).sum();
        let r2 = if sst > 0.0 {
            1.0 - ssr / sst
        } else if ssr == 0.0 {
            1.0
        } else {
            0.0
        };

        let mda = if a.len() > 1 {
            let hits = (1..a.len())
                .filter(|&i| (a[i] - a[i - 1]).signum() == (p[i] - a[i - 1]).signum())
                .count();
            hits as f64 / (n - 1.0) * 100.0
        } else {
            f64::NAN
        };

        let msa = a
            .iter()
            .zip(&p)
            .filter(|(a, p)| sign(**a) == sign(**p))
            .count() as f64
            / n
            * 100.0;

        Ok(PredictionMetrics {
            mfe,
            mae,
            mape,
            mse,
            max_error,
            rse,
            mase,
            r2,
            mda,
            msa,
        })
    }
}

/// -1, 0 or 1. Unlike `f64::signum`, zero maps to 0.
pub fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
