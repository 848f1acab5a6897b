//! Directional classification of predicted vs. actual returns.
//!
//! Both series are reduced to signs. When the predictions are returns earned
//! by following a signal, a positive return on a falling baseline means the
//! signal called the fall correctly, so the predicted sign is flipped wherever
//! the actual sign is negative.

use crate::domain::error::InsightError;
use crate::domain::metrics::{TRADING_DAYS_PER_YEAR, sign};
use crate::domain::series::{TimeSeries, aligned_values};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    pub fn from_value(value: f64) -> Self {
        Self::from_label(sign(value))
    }

    fn from_label(label: i8) -> Self {
        match label {
            1 => Signal::Buy,
            -1 => Signal::Sell,
            _ => Signal::Hold,
        }
    }

    pub fn label(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Hold => 0,
            Signal::Sell => -1,
        }
    }

    fn flipped(self) -> Self {
        Self::from_label(-self.label())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "Buy"),
            Signal::Hold => write!(f, "Hold"),
            Signal::Sell => write!(f, "Sell"),
        }
    }
}

/// Confusion-matrix normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    /// Each actual-class row sums to 1.
    True,
    /// Each predicted-class column sums to 1.
    Pred,
    /// The whole matrix sums to 1.
    All,
}

impl FromStr for Normalize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "true" => Ok(Normalize::True),
            "pred" => Ok(Normalize::Pred),
            "all" => Ok(Normalize::All),
            other => Err(format!("expected true, pred or all, got `{other}`")),
        }
    }
}

impl fmt::Display for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalize::True => write!(f, "true"),
            Normalize::Pred => write!(f, "pred"),
            Normalize::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationConfig {
    /// Drop periods where either side is zero and classify Buy/Sell only.
    pub no_hold: bool,
    pub normalize: Option<Normalize>,
    /// Predictions are returns, so apply sign correction.
    pub returns_data: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            no_hold: false,
            normalize: None,
            returns_data: true,
        }
    }
}

/// Counts indexed `[actual][predicted]` over `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub labels: Vec<Signal>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_signals(labels: Vec<Signal>, actual: &[Signal], predicted: &[Signal]) -> Self {
        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (a, p) in actual.iter().zip(predicted) {
            let row = labels.iter().position(|l| l == a);
            let col = labels.iter().position(|l| l == p);
            if let (Some(row), Some(col)) = (row, col) {
                counts[row][col] += 1;
            }
        }
        Self { labels, counts }
    }

    pub fn get(&self, actual: Signal, predicted: Signal) -> usize {
        let row = self.labels.iter().position(|l| *l == actual);
        let col = self.labels.iter().position(|l| *l == predicted);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn off_diagonal(&self) -> usize {
        self.total() - (0..self.labels.len()).map(|i| self.counts[i][i]).sum::<usize>()
    }

    /// Normalised copy. Empty rows or columns normalise to 0.
    pub fn normalized(&self, mode: Normalize) -> Vec<Vec<f64>> {
        let size = self.labels.len();
        let row_sums: Vec<usize> = self.counts.iter().map(|r| r.iter().sum()).collect();
        let col_sums: Vec<usize> = (0..size)
            .map(|c| self.counts.iter().map(|r| r[c]).sum())
            .collect();
        let total = self.total();

        (0..size)
            .map(|r| {
                (0..size)
                    .map(|c| {
                        let denom = match mode {
                            Normalize::True => row_sums[r],
                            Normalize::Pred => col_sums[c],
                            Normalize::All => total,
                        };
                        if denom == 0 {
                            0.0
                        } else {
                            self.counts[r][c] as f64 / denom as f64
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn column_total(&self, predicted: Signal) -> usize {
        self.labels
            .iter()
            .map(|a| self.get(*a, predicted))
            .sum()
    }

    fn row_total(&self, actual: Signal) -> usize {
        self.labels
            .iter()
            .map(|p| self.get(actual, *p))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub signal: Signal,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of actual periods in this class.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<Signal>,
    /// Predicted signals after sign correction.
    pub predicted: Vec<Signal>,
    pub matrix: ConfusionMatrix,
    pub normalize: Option<Normalize>,
    pub wins: usize,
    pub losses: usize,
    pub total: usize,
    pub accuracy: f64,
    pub information_coefficient: f64,
    /// Annualised expected value of following the predictions.
    pub expected_value: f64,
    pub mean_buy_return: f64,
    pub mean_sell_return: f64,
    pub scores: Vec<ClassScore>,
}

impl ClassificationReport {
    pub fn diff(&self) -> i64 {
        self.wins as i64 - self.losses as i64
    }

    pub fn score(&self, signal: Signal) -> Option<&ClassScore> {
        self.scores.iter().find(|s| s.signal == signal)
    }

    /// The matrix as reported: normalised when requested, raw counts otherwise.
    pub fn matrix_values(&self) -> Vec<Vec<f64>> {
        match self.normalize {
            Some(mode) => self.matrix.normalized(mode),
            None => self
                .matrix
                .counts
                .iter()
                .map(|r| r.iter().map(|c| *c as f64).collect())
                .collect(),
        }
    }
}

fn paired_values(
    actual: &TimeSeries,
    predicted: &TimeSeries,
    no_hold: bool,
) -> Result<(Vec<NaiveDate>, Vec<f64>, Vec<f64>), InsightError> {
    if !no_hold {
        let (a, p) = aligned_values(actual, predicted)?;
        return Ok((actual.dates(), a, p));
    }

    let mut dates = Vec::new();
    let mut a = Vec::new();
    let mut p = Vec::new();
    for point in actual.points.iter().filter(|pt| pt.value != 0.0) {
        if let Some(pred) = predicted.get(point.date).filter(|v| *v != 0.0) {
            dates.push(point.date);
            a.push(point.value);
            p.push(pred);
        }
    }
    Ok((dates, a, p))
}

fn mean_return(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).exp() - 1.0
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Classifies `predicted` against `actual` and derives the report.
pub fn evaluate(
    actual: &TimeSeries,
    predicted: &TimeSeries,
    config: &ClassificationConfig,
) -> Result<ClassificationReport, InsightError> {
    actual.ensure_numeric()?;
    predicted.ensure_numeric()?;
    actual.ensure_sorted()?;
    predicted.ensure_sorted()?;

    let (dates, actual_values, predicted_values) =
        paired_values(actual, predicted, config.no_hold)?;
    if dates.is_empty() {
        return Err(InsightError::computation(
            "no periods left to classify",
        ));
    }

    let actual_signals: Vec<Signal> = actual_values.iter().map(|v| Signal::from_value(*v)).collect();
    let predicted_signals: Vec<Signal> = predicted_values
        .iter()
        .zip(&actual_signals)
        .map(|(v, a)| {
            let s = Signal::from_value(*v);
            if config.returns_data && *a == Signal::Sell {
                s.flipped()
            } else {
                s
            }
        })
        .collect();

    let labels = if config.no_hold {
        vec![Signal::Buy, Signal::Sell]
    } else {
        vec![Signal::Buy, Signal::Hold, Signal::Sell]
    };
    let matrix = ConfusionMatrix::from_signals(labels, &actual_signals, &predicted_signals);

    let total = actual_signals.len();
    let wins = actual_signals
        .iter()
        .zip(&predicted_signals)
        .filter(|(a, p)| a == p)
        .count();
    let accuracy = wins as f64 / total as f64;

    let mean_buy_return = mean_return(actual_values.iter().copied().filter(|v| *v > 0.0));
    let mean_sell_return = mean_return(actual_values.iter().copied().filter(|v| *v < 0.0));
    let class_mean = |s: Signal| match s {
        Signal::Buy => mean_buy_return,
        Signal::Sell => mean_sell_return,
        Signal::Hold => 0.0,
    };

    let weights = matrix.normalized(config.normalize.unwrap_or(Normalize::All));
    let mut expected = 0.0;
    for (r, a) in matrix.labels.iter().enumerate() {
        for (c, p) in matrix.labels.iter().enumerate() {
            expected += weights[r][c] * f64::from(p.label()) * class_mean(*a);
        }
    }

    let scores = matrix
        .labels
        .iter()
        .map(|&signal| {
            let tp = matrix.get(signal, signal);
            let support = matrix.row_total(signal);
            let precision = ratio(tp, matrix.column_total(signal));
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassScore {
                signal,
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    Ok(ClassificationReport {
        dates,
        actual: actual_signals,
        predicted: predicted_signals,
        matrix,
        normalize: config.normalize,
        wins,
        losses: total - wins,
        total,
        accuracy,
        information_coefficient: 2.0 * accuracy - 1.0,
        expected_value: expected * TRADING_DAYS_PER_YEAR,
        mean_buy_return,
        mean_sell_return,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        TimeSeries::from_pairs(
            name,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + chrono::Duration::days(i as i64), *v)),
        )
    }

    #[test]
    fn sign_correction_flips_on_falling_actual() {
        let actual = series("a", &[-0.02, 0.03]);
        let predicted = series("p", &[0.01, 0.02]);
        let report = evaluate(&actual, &predicted, &ClassificationConfig::default()).unwrap();

        assert_eq!(report.predicted, vec![Signal::Sell, Signal::Buy]);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.matrix.off_diagonal(), 0);
        assert_eq!(report.information_coefficient, 1.0);
    }

    #[test]
    fn directional_inputs_skip_correction() {
        let actual = series("a", &[-1.0, 1.0]);
        let predicted = series("p", &[1.0, 1.0]);
        let config = ClassificationConfig {
            returns_data: false,
            ..Default::default()
        };
        let report = evaluate(&actual, &predicted, &config).unwrap();
        assert_eq!(report.wins, 1);
        assert_eq!(report.matrix.get(Signal::Sell, Signal::Buy), 1);
    }

    #[test]
    fn no_hold_intersects_non_zero_periods() {
        let actual = series("a", &[0.0, 0.01, -0.02]);
        let predicted = series("p", &[0.01, 0.0, 0.03]);
        let config = ClassificationConfig {
            no_hold: true,
            ..Default::default()
        };
        let report = evaluate(&actual, &predicted, &config).unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.dates, vec![actual.points[2].date]);
        assert_eq!(report.matrix.labels, vec![Signal::Buy, Signal::Sell]);
    }

    #[test]
    fn no_hold_rejects_reversed_predictions() {
        let actual = series("a", &[0.01, -0.02, 0.03]);
        let mut predicted = series("p", &[0.02, 0.01, -0.01]);
        predicted.points.reverse();
        let config = ClassificationConfig {
            no_hold: true,
            ..Default::default()
        };
        match evaluate(&actual, &predicted, &config) {
            Err(InsightError::Computation { reason }) => {
                assert!(reason.contains("not in date order"), "{reason}")
            }
            other => panic!("expected an ordering error, got {other:?}"),
        }
    }

    #[test]
    fn hold_class_included_by_default() {
        let actual = series("a", &[0.0, 0.01, -0.02]);
        let predicted = series("p", &[0.0, 0.02, 0.01]);
        let report = evaluate(&actual, &predicted, &ClassificationConfig::default()).unwrap();
        assert_eq!(report.matrix.labels.len(), 3);
        assert_eq!(report.matrix.get(Signal::Hold, Signal::Hold), 1);
        assert_eq!(report.wins, 2);
    }

    #[test]
    fn mismatched_index_is_a_computation_error() {
        let actual = series("a", &[0.01, 0.02, 0.03]);
        let predicted = series("p", &[0.01, 0.02]);
        assert!(matches!(
            evaluate(&actual, &predicted, &ClassificationConfig::default()),
            Err(InsightError::Computation { .. })
        ));
    }

    #[test]
    fn empty_after_no_hold_fails() {
        let actual = series("a", &[0.0, 0.0]);
        let predicted = series("p", &[0.01, 0.02]);
        let config = ClassificationConfig {
            no_hold: true,
            ..Default::default()
        };
        assert!(evaluate(&actual, &predicted, &config).is_err());
    }

    #[test]
    fn precision_recall_and_f1() {
        // actual:    B B S S
        // predicted: B S S B (after correction)
        let actual = series("a", &[0.01, 0.02, -0.01, -0.02]);
        let predicted = series("p", &[0.01, -0.02, 0.01, -0.02]);
        let report = evaluate(&actual, &predicted, &ClassificationConfig::default()).unwrap();

        let buy = report.score(Signal::Buy).unwrap();
        assert_abs_diff_eq!(buy.precision, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(buy.recall, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(buy.f1, 0.5, epsilon = 1e-12);
        assert_eq!(buy.support, 2);

        let hold = report.score(Signal::Hold).unwrap();
        assert_eq!(hold.precision, 0.0);
        assert_eq!(hold.support, 0);
        assert_eq!(report.diff(), 0);
    }

    #[test]
    fn expected_value_of_perfect_calls() {
        let actual = series("a", &[0.01, -0.01]);
        let predicted = series("p", &[0.01, 0.01]);
        let config = ClassificationConfig {
            no_hold: true,
            ..Default::default()
        };
        let report = evaluate(&actual, &predicted, &config).unwrap();
        // Buy row: 0.5 * +1 * mean_buy; Sell row: 0.5 * -1 * mean_sell.
        let expected =
            (0.5 * report.mean_buy_return - 0.5 * report.mean_sell_return) * TRADING_DAYS_PER_YEAR;
        assert_abs_diff_eq!(report.expected_value, expected, epsilon = 1e-12);
        assert!(report.expected_value > 0.0);
    }

    #[test]
    fn normalization_modes() {
        let m = ConfusionMatrix::from_signals(
            vec![Signal::Buy, Signal::Sell],
            &[Signal::Buy, Signal::Buy, Signal::Sell],
            &[Signal::Buy, Signal::Sell, Signal::Sell],
        );
        assert_eq!(m.normalized(Normalize::True), vec![vec![0.5, 0.5], vec![0.0, 1.0]]);
        assert_eq!(m.normalized(Normalize::Pred), vec![vec![1.0, 0.5], vec![0.0, 0.5]]);
        let all = m.normalized(Normalize::All);
        assert_abs_diff_eq!(all[0][0] + all[0][1] + all[1][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn normalize_parses_keywords() {
        assert_eq!("pred".parse::<Normalize>(), Ok(Normalize::Pred));
        assert_eq!("ALL".parse::<Normalize>(), Ok(Normalize::All));
        assert!("rows".parse::<Normalize>().is_err());
    }
}
