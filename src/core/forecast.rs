//! ARIMA(p, d, q) estimation and point/interval forecasting.
//!
//! The AR part is estimated by ordinary least squares on the differenced
//! series. Models with moving-average terms use the Hannan-Rissanen two-step
//! regression: a long autoregression supplies residual estimates, which then
//! enter a second regression as lagged innovations.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

/// Model order triple `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize, usize)", into = "(usize, usize, usize)")]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        ArimaOrder { p: 5, d: 1, q: 0 }
    }
}

impl From<(usize, usize, usize)> for ArimaOrder {
    fn from((p, d, q): (usize, usize, usize)) -> Self {
        ArimaOrder { p, d, q }
    }
}

impl From<ArimaOrder> for (usize, usize, usize) {
    fn from(order: ArimaOrder) -> Self {
        (order.p, order.d, order.q)
    }
}

impl Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Not enough observations to fit {order}: need at least {needed}, got {got}")]
    InsufficientData {
        order: ArimaOrder,
        needed: usize,
        got: usize,
    },
    #[error("Cannot estimate {0}: the regression is singular")]
    Singular(ArimaOrder),
    #[error("Confidence level must be strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
}

/// Forecast for one future step on the undifferenced scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastStep {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A fitted ARIMA model, holding the observations needed to forecast from
/// the end of the training series.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    pub order: ArimaOrder,
    pub constant: f64,
    pub ar_coeffs: Vec<f64>,
    pub ma_coeffs: Vec<f64>,
    /// Innovation variance estimate.
    pub sigma2: f64,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    // Last value of each differencing level, level 0 being the input series.
    level_tails: Vec<f64>,
}

impl ArimaModel {
    pub fn fit(series: &[f64], order: ArimaOrder) -> Result<Self, ForecastError> {
        let ArimaOrder { p, d, q } = order;
        let needed = p + d + q + 10;
        if series.len() < needed {
            return Err(ForecastError::InsufficientData {
                order,
                needed,
                got: series.len(),
            });
        }

        let mut level_tails = Vec::with_capacity(d);
        let mut differenced = series.to_vec();
        for _ in 0..d {
            level_tails.push(differenced[differenced.len() - 1]);
            differenced = difference(&differenced);
        }

        let (constant, ar_coeffs, ma_coeffs) = if q == 0 {
            let beta = fit_autoregression(&differenced, p).ok_or(ForecastError::Singular(order))?;
            (beta[0], beta.iter().skip(1).copied().collect(), Vec::new())
        } else {
            hannan_rissanen(&differenced, order)?
        };

        let residuals = arma_residuals(&differenced, constant, &ar_coeffs, &ma_coeffs);
        let fitted = &residuals[p..];
        let sigma2 = fitted.iter().map(|e| e * e).sum::<f64>() / fitted.len() as f64;

        debug!(
            %order,
            constant,
            ?ar_coeffs,
            ?ma_coeffs,
            sigma2,
            "Fitted model"
        );

        Ok(Self {
            order,
            constant,
            ar_coeffs,
            ma_coeffs,
            sigma2,
            differenced,
            residuals,
            level_tails,
        })
    }

    /// Forecasts `steps` values past the end of the training series, each with
    /// a two-sided interval at the given confidence level.
    pub fn forecast(
        &self,
        steps: usize,
        confidence: f64,
    ) -> Result<Vec<ForecastStep>, ForecastError> {
        let z = two_sided_z(confidence)?;
        let means = self.point_forecast(steps);
        let psi = integrated_psi_weights(&self.ar_coeffs, &self.ma_coeffs, self.order.d, steps);

        let mut cumulative = 0.0;
        Ok(means
            .into_iter()
            .zip(psi)
            .map(|(mean, weight)| {
                cumulative += weight * weight;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                ForecastStep {
                    mean,
                    lower: mean - half_width,
                    upper: mean + half_width,
                }
            })
            .collect())
    }

    fn point_forecast(&self, steps: usize) -> Vec<f64> {
        let mut values = self.differenced.clone();
        let mut shocks = self.residuals.clone();
        let mut forecasts = Vec::with_capacity(steps);

        for _ in 0..steps {
            let n = values.len();
            let ar: f64 = self
                .ar_coeffs
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * values[n - 1 - i])
                .sum();
            let ma: f64 = self
                .ma_coeffs
                .iter()
                .enumerate()
                .map(|(j, theta)| theta * shocks[n - 1 - j])
                .sum();
            let next = self.constant + ar + ma;
            values.push(next);
            // Future innovations have zero expectation
            shocks.push(0.0);
            forecasts.push(next);
        }

        for tail in self.level_tails.iter().rev() {
            forecasts = integrate(&forecasts, *tail);
        }
        forecasts
    }
}

/// First differences of `data`.
pub fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

fn integrate(diffs: &[f64], start: f64) -> Vec<f64> {
    let mut level = start;
    diffs
        .iter()
        .map(|d| {
            level += d;
            level
        })
        .collect()
}

fn two_sided_z(confidence: f64) -> Result<f64, ForecastError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ForecastError::InvalidConfidence(confidence));
    }
    let normal =
        Normal::new(0.0, 1.0).map_err(|_| ForecastError::InvalidConfidence(confidence))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// Solves `y = X beta` by OLS; `None` when X'X cannot be inverted.
fn least_squares(x_data: &[f64], rows: usize, cols: usize, y: Vec<f64>) -> Option<DVector<f64>> {
    let x = DMatrix::from_row_slice(rows, cols, x_data);
    let y = DVector::from_vec(y);
    let xtx_inv = (x.transpose() * &x).try_inverse()?;
    let beta = xtx_inv * (x.transpose() * y);
    beta.iter().all(|b| b.is_finite()).then_some(beta)
}

/// Regresses `data[t]` on a constant and `p` lags. Returns `[c, phi_1..phi_p]`.
fn fit_autoregression(data: &[f64], p: usize) -> Option<DVector<f64>> {
    let n = data.len();
    let mut x_data = Vec::with_capacity((n - p) * (p + 1));
    for t in p..n {
        x_data.push(1.0);
        x_data.extend((1..=p).map(|i| data[t - i]));
    }
    least_squares(&x_data, n - p, p + 1, data[p..].to_vec())
}

fn hannan_rissanen(
    data: &[f64],
    order: ArimaOrder,
) -> Result<(f64, Vec<f64>, Vec<f64>), ForecastError> {
    let ArimaOrder { p, q, .. } = order;
    let n = data.len();

    // Step 1: long autoregression for innovation estimates
    let long_order = (p + q).max(8).min((n / 4).max(1));
    let long_ar = fit_autoregression(data, long_order).ok_or(ForecastError::Singular(order))?;
    let mut innovations = vec![0.0; n];
    for t in long_order..n {
        let predicted: f64 = long_ar[0]
            + (1..=long_order)
                .map(|i| long_ar[i] * data[t - i])
                .sum::<f64>();
        innovations[t] = data[t] - predicted;
    }

    // Step 2: regression on lagged values and lagged innovations
    let start = p.max(long_order + q);
    let cols = 1 + p + q;
    if n <= start + cols {
        return Err(ForecastError::InsufficientData {
            order,
            needed: start + cols + 1 + order.d,
            got: n + order.d,
        });
    }
    let rows = n - start;
    let mut x_data = Vec::with_capacity(rows * cols);
    for t in start..n {
        x_data.push(1.0);
        x_data.extend((1..=p).map(|i| data[t - i]));
        x_data.extend((1..=q).map(|j| innovations[t - j]));
    }
    let beta = least_squares(&x_data, rows, cols, data[start..].to_vec())
        .ok_or(ForecastError::Singular(order))?;

    Ok((
        beta[0],
        beta.iter().skip(1).take(p).copied().collect(),
        beta.iter().skip(1 + p).take(q).copied().collect(),
    ))
}

/// One-step-ahead prediction errors, conditional on zero pre-sample shocks.
fn arma_residuals(data: &[f64], constant: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut residuals = vec![0.0; data.len()];
    for t in p..data.len() {
        let ar_part: f64 = ar.iter().enumerate().map(|(i, phi)| phi * data[t - 1 - i]).sum();
        let ma_part: f64 = ma
            .iter()
            .enumerate()
            .filter(|(j, _)| t > *j)
            .map(|(j, theta)| theta * residuals[t - 1 - j])
            .sum();
        residuals[t] = data[t] - constant - ar_part - ma_part;
    }
    residuals
}

/// MA(infinity) weights of the ARMA part, cumulatively summed `d` times so
/// they apply to the undifferenced series.
fn integrated_psi_weights(ar: &[f64], ma: &[f64], d: usize, steps: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(steps);
    for j in 0..steps {
        let weight = if j == 0 {
            1.0
        } else {
            let ma_term = ma.get(j - 1).copied().unwrap_or(0.0);
            let ar_term: f64 = ar
                .iter()
                .enumerate()
                .take(j)
                .map(|(i, phi)| phi * psi[j - 1 - i])
                .sum();
            ma_term + ar_term
        };
        psi.push(weight);
    }
    for _ in 0..d {
        psi = integrate(&psi, 0.0);
    }
    psi
}
