//! Rolling and lagged statistics over plain value slices.
//!
//! Rolling results are aligned by `offset`: `out[i]` is the statistic of the
//! `window` values ending at `i + offset`. An offset of `window / 2` centres
//! the window on `i`. Positions whose window falls outside the data are `None`.

use crate::domain::error::InsightError;
use crate::domain::ohlcv::OhlcBar;

fn trailing<F>(values: &[f64], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                stat(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

fn shift_back(values: Vec<Option<f64>>, offset: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| values.get(i + offset).copied().flatten())
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn rolling_mean(values: &[f64], window: usize, offset: usize) -> Vec<Option<f64>> {
    shift_back(trailing(values, window, |w| Some(mean(w))), offset)
}

pub fn rolling_var(values: &[f64], window: usize, offset: usize) -> Vec<Option<f64>> {
    shift_back(trailing(values, window, |w| Some(variance(w))), offset)
}

pub fn rolling_std(values: &[f64], window: usize, offset: usize) -> Vec<Option<f64>> {
    shift_back(
        trailing(values, window, |w| Some(variance(w).sqrt())),
        offset,
    )
}

/// EMA with k = 2/(n+1), seeded with the SMA of the first `window` values.
pub fn ema(values: &[f64], window: usize, offset: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let k = 2.0 / (window as f64 + 1.0);
    let mut current = mean(&values[..window]);
    out[window - 1] = Some(current);
    for i in window..values.len() {
        current = values[i] * k + current * (1.0 - k);
        out[i] = Some(current);
    }
    shift_back(out, offset)
}

/// Pearson correlation; `None` when either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    if va <= 0.0 || vb <= 0.0 {
        return None;
    }
    Some(cov / (va.sqrt() * vb.sqrt()))
}

/// Correlation of a series with itself `lag` periods earlier.
pub fn lagged_correlation(values: &[f64], lag: usize) -> Option<f64> {
    if lag >= values.len() {
        return None;
    }
    pearson(&values[lag..], &values[..values.len() - lag])
}

/// Sample autocorrelation for every lag `0..n`, normalised by the lag-0 term.
pub fn autocorrelation(values: &[f64]) -> Result<Vec<f64>, InsightError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let m = mean(values);
    let centred: Vec<f64> = values.iter().map(|v| v - m).collect();
    let c0: f64 = centred.iter().map(|v| v * v).sum();
    if c0 <= 0.0 {
        return Err(InsightError::computation(
            "autocorrelation of a constant series is undefined",
        ));
    }

    Ok((0..centred.len())
        .map(|lag| {
            centred[lag..]
                .iter()
                .zip(&centred)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / c0
        })
        .collect())
}

/// Moving autocorrelation: lagged correlation inside each rolling window.
pub fn rolling_autocorr(
    values: &[f64],
    lag: usize,
    window: usize,
    offset: usize,
) -> Vec<Option<f64>> {
    shift_back(
        trailing(values, window, |w| lagged_correlation(w, lag)),
        offset,
    )
}

/// Stochastic oscillator: %K over `window` bars, %D as the 3-period SMA of %K.
pub fn stochastic(bars: &[OhlcBar], window: usize) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let k: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let span = &bars[i + 1 - window..=i];
            let lowest = span.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let highest = span.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            if range > 0.0 {
                Some((bars[i].close - lowest) / range * 100.0)
            } else {
                None
            }
        })
        .collect();

    let d = (0..k.len())
        .map(|i| {
            if i < 2 {
                return None;
            }
            let span: Option<Vec<f64>> = k[i - 2..=i].iter().copied().collect();
            span.map(|s| mean(&s))
        })
        .collect();

    (k, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn unwrap_all(values: &[Option<f64>]) -> Vec<f64> {
        values.iter().map(|v| v.unwrap()).collect()
    }

    #[test]
    fn rolling_mean_trailing_window() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2, 0);
        assert_eq!(out[0], None);
        assert_eq!(unwrap_all(&out[1..]), vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn rolling_mean_centred_by_offset() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3, 1);
        assert_eq!(out, vec![None, Some(2.0), Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn rolling_std_known_values() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&values, 8, 0);
        assert_abs_diff_eq!(out[7].unwrap(), 2.0, epsilon = 1e-10);
        assert!(out[6].is_none());
    }

    #[test]
    fn rolling_var_is_square_of_std() {
        let values = [0.01, -0.02, 0.03, 0.0, 0.015];
        let var = rolling_var(&values, 3, 0);
        let std = rolling_std(&values, 3, 0);
        for (v, s) in var.iter().zip(&std).skip(2) {
            assert_abs_diff_eq!(v.unwrap(), s.unwrap().powi(2), epsilon = 1e-15);
        }
    }

    #[test]
    fn ema_seeds_with_sma() {
        let out = ema(&[10.0, 20.0, 30.0, 40.0], 3, 0);
        assert_eq!(out[1], None);
        assert_abs_diff_eq!(out[2].unwrap(), 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[3].unwrap(), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn ema_short_input_is_all_missing() {
        assert_eq!(ema(&[1.0, 2.0], 3, 0), vec![None, None]);
    }

    #[test]
    fn pearson_perfect_and_constant() {
        assert_abs_diff_eq!(
            pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(),
            -1.0,
            epsilon = 1e-12
        );
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn autocorrelation_lag_zero_is_one() {
        let acf = autocorrelation(&[1.0, -1.0, 1.0, -1.0]).unwrap();
        assert_eq!(acf.len(), 4);
        assert_abs_diff_eq!(acf[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(acf[1], -0.75, epsilon = 1e-12);
    }

    #[test]
    fn autocorrelation_of_constant_fails() {
        assert!(autocorrelation(&[2.0, 2.0, 2.0]).is_err());
        assert!(autocorrelation(&[]).unwrap().is_empty());
    }

    #[test]
    fn rolling_autocorr_alternating_series() {
        let values = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let out = rolling_autocorr(&values, 1, 4, 0);
        assert!(out[2].is_none());
        assert_abs_diff_eq!(out[3].unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn stochastic_close_at_high_is_100() {
        let bars: Vec<OhlcBar> = (0..5)
            .map(|i| {
                let c = 10.0 + i as f64;
                OhlcBar {
                    date: NaiveDate::from_ymd_opt(2024, 1, i + 1).unwrap(),
                    open: c,
                    high: c,
                    low: c - 1.0,
                    close: c,
                }
            })
            .collect();
        let (k, d) = stochastic(&bars, 3);
        assert!(k[1].is_none());
        assert_abs_diff_eq!(k[2].unwrap(), 100.0, epsilon = 1e-12);
        assert!(d[3].is_none());
        assert_abs_diff_eq!(d[4].unwrap(), 100.0, epsilon = 1e-12);
    }
}
