// Fixed-order ARIMA(1,1,1) forecasting for short annual series.
//
// The model is fitted on the first difference `w_t = y_t - y_{t-1}`:
//
// ```text
// w_t = φ·w_{t-1} + ε_t + θ·ε_{t-1}
// ```
//
// There is no constant term. Parameters are estimated by conditional sum
// of squares (pre-sample residual set to zero), minimised with Nelder–Mead
// over `tanh`-transformed coordinates so that |φ| < 1 and |θ| < 1 hold
// throughout the search. Starting values come from the lag-one
// autocorrelation of the differences (Yule–Walker) and of the resulting
// AR residuals.

use crate::error::ForecastError;
use crate::types::{ForecastPoint, YearTotal};
use log::debug;
use serde::Serialize;

/// Fewest observations the fit accepts: two differences.
pub const MIN_OBSERVATIONS: usize = 3;

/// Bound on the coefficients so the fitted model stays strictly stationary
/// and invertible.
const COEFF_LIMIT: f64 = 0.999;
/// Box for the unconstrained search coordinates; `tanh(6)` is already
/// indistinguishable from 1 at the precision that matters here.
const SEARCH_BOUND: f64 = 6.0;
const MAX_ITERATIONS: usize = 2000;
const Z_95: f64 = 1.959_963_984_540_054;

type FitResult<T> = std::result::Result<T, ForecastError>;

/// In-sample one-step-ahead accuracy of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitAccuracy {
    pub mae: f64,
    pub rmse: f64,
}

/// A fitted ARIMA(1,1,1) model.
#[derive(Debug, Clone, Serialize)]
pub struct Arima111 {
    /// AR coefficient (φ)
    phi: f64,
    /// MA coefficient (θ)
    theta: f64,
    /// Innovation variance on the original scale
    sigma2: f64,
    /// Observed levels
    observed: Vec<f64>,
    /// First differences of the observed levels
    differenced: Vec<f64>,
    /// CSS residuals aligned with `differenced`; the first is the zero pre-sample value
    residuals: Vec<f64>,
    /// Nelder–Mead iterations used
    iterations: usize,
}

impl Arima111 {
    /// Fit the model to a regularly spaced series.
    pub fn fit(series: &[f64]) -> FitResult<Self> {
        if series.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: series.len(),
            });
        }
        if series.iter().any(|x| !x.is_finite()) {
            return Err(ForecastError::NonFinite(
                "series contains NaN or infinite values".to_string(),
            ));
        }

        let differenced = difference(series);
        let level = series.iter().fold(0.0_f64, |acc, x| acc.max(x.abs())).max(1.0);
        let scale = (differenced.iter().map(|w| w * w).sum::<f64>() / differenced.len() as f64).sqrt();
        if scale <= f64::EPSILON * level {
            return Err(ForecastError::ConstantSeries);
        }
        let z: Vec<f64> = differenced.iter().map(|w| w / scale).collect();

        let (phi0, theta0) = initial_estimates(&z);
        let start = [to_search(phi0), to_search(theta0)];
        let (best, _, iterations) = nelder_mead(|x| css(&z, from_search(x[0]), from_search(x[1])), start)?;

        let phi = from_search(best[0]);
        let theta = from_search(best[1]);
        let residuals: Vec<f64> = css_residuals(&z, phi, theta).iter().map(|e| e * scale).collect();
        let terms = residuals.len() - 1;
        let sigma2 = residuals[1..].iter().map(|e| e * e).sum::<f64>() / terms as f64;
        if !phi.is_finite() || !theta.is_finite() || !sigma2.is_finite() {
            return Err(ForecastError::NonFinite("fitted parameters".to_string()));
        }
        debug!("ARIMA(1,1,1) fit: phi={phi:.4} theta={theta:.4} sigma2={sigma2:.2} in {iterations} iterations");

        Ok(Self {
            phi,
            theta,
            sigma2,
            observed: series.to_vec(),
            differenced,
            residuals,
            iterations,
        })
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// One-step-ahead fitted levels for observations 3..n.
    pub fn fitted_values(&self) -> Vec<f64> {
        (1..self.differenced.len())
            .map(|t| self.observed[t + 1] - self.residuals[t])
            .collect()
    }

    pub fn accuracy(&self) -> FitAccuracy {
        let actual = &self.observed[2..];
        let fitted = self.fitted_values();
        FitAccuracy {
            mae: mae(actual, &fitted),
            rmse: rmse(actual, &fitted),
        }
    }

    /// Point forecasts and standard errors for the next `steps` periods.
    pub fn predict(&self, steps: usize) -> FitResult<Vec<(f64, f64)>> {
        if steps == 0 {
            return Err(ForecastError::InvalidHorizon);
        }
        let last_w = self.differenced[self.differenced.len() - 1];
        let last_e = self.residuals[self.residuals.len() - 1];
        let mut level = self.observed[self.observed.len() - 1];

        let mut out = Vec::with_capacity(steps);
        let mut w_hat = self.phi * last_w + self.theta * last_e;
        // Cumulative psi weights of the integrated process.
        let mut psi = 1.0;
        let mut psi_cum = 1.0;
        let mut var_sum = 0.0;
        for h in 0..steps {
            if h > 0 {
                w_hat *= self.phi;
                psi = if h == 1 { self.phi + self.theta } else { psi * self.phi };
                psi_cum += psi;
            }
            level += w_hat;
            var_sum += psi_cum * psi_cum;
            let se = (self.sigma2 * var_sum).sqrt();
            if !level.is_finite() || !se.is_finite() {
                return Err(ForecastError::NonFinite(format!("forecast step {}", h + 1)));
            }
            out.push((level, se));
        }
        Ok(out)
    }
}

/// Fit ARIMA(1,1,1) to a yearly series and forecast `horizon` years past
/// its last year.
///
/// Totals are converted to `f64`, so values above 2^53 lose precision and
/// small year-to-year changes at that level read as a constant series.
pub fn forecast(series: &[YearTotal], horizon: usize) -> FitResult<Vec<ForecastPoint>> {
    let (_, points) = forecast_with_model(series, horizon)?;
    Ok(points)
}

/// Same as [`forecast`], also returning the fitted model.
pub fn forecast_with_model(series: &[YearTotal], horizon: usize) -> FitResult<(Arima111, Vec<ForecastPoint>)> {
    if horizon == 0 {
        return Err(ForecastError::InvalidHorizon);
    }
    if series.windows(2).any(|w| w[1].year != w[0].year + 1) {
        debug!("yearly series is not contiguous; forecasting it as regularly spaced");
    }
    let values: Vec<f64> = series.iter().map(|t| t.total as f64).collect();
    let model = Arima111::fit(&values)?;
    let last_year = series.last().map(|t| t.year).unwrap_or_default();
    let points = model
        .predict(horizon)?
        .into_iter()
        .zip(1..)
        .map(|((predicted, se), step)| ForecastPoint {
            year: last_year + step,
            predicted,
            lower: predicted - Z_95 * se,
            upper: predicted + Z_95 * se,
        })
        .collect();
    Ok((model, points))
}

fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

fn from_search(x: f64) -> f64 {
    COEFF_LIMIT * x.clamp(-SEARCH_BOUND, SEARCH_BOUND).tanh()
}

fn to_search(coeff: f64) -> f64 {
    (coeff / COEFF_LIMIT).clamp(-0.95, 0.95).atanh()
}

/// Lag-one autocorrelation without centering; the model has no mean.
fn lag_one_autocorrelation(data: &[f64]) -> f64 {
    let denom: f64 = data.iter().map(|x| x * x).sum();
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    let num: f64 = data.windows(2).map(|w| w[0] * w[1]).sum();
    num / denom
}

fn initial_estimates(z: &[f64]) -> (f64, f64) {
    let phi = lag_one_autocorrelation(z).clamp(-0.9, 0.9);
    let ar_residuals: Vec<f64> = z.windows(2).map(|w| w[1] - phi * w[0]).collect();
    let theta = lag_one_autocorrelation(&ar_residuals).clamp(-0.9, 0.9);
    (phi, theta)
}

fn css_residuals(z: &[f64], phi: f64, theta: f64) -> Vec<f64> {
    let mut e = vec![0.0; z.len()];
    for t in 1..z.len() {
        e[t] = z[t] - phi * z[t - 1] - theta * e[t - 1];
    }
    e
}

fn css(z: &[f64], phi: f64, theta: f64) -> f64 {
    css_residuals(z, phi, theta).iter().map(|e| e * e).sum()
}

/// Minimise `f` over two dimensions. Returns the best point, its value and
/// the iterations used.
fn nelder_mead<F>(f: F, start: [f64; 2]) -> FitResult<([f64; 2], f64, usize)>
where
    F: Fn(&[f64; 2]) -> f64,
{
    const ALPHA: f64 = 1.0;
    const GAMMA: f64 = 2.0;
    const RHO: f64 = 0.5;
    const SIGMA: f64 = 0.5;
    const FATOL: f64 = 1e-10;
    const XATOL: f64 = 1e-7;

    let mut simplex: Vec<([f64; 2], f64)> = [
        start,
        [start[0] + 0.25, start[1]],
        [start[0], start[1] + 0.25],
    ]
    .into_iter()
    .map(|p| (p, f(&p)))
    .collect();

    for iteration in 0..MAX_ITERATIONS {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        if simplex.iter().any(|(_, v)| !v.is_finite()) {
            return Err(ForecastError::NonFinite("objective".to_string()));
        }

        let (best, worst) = (simplex[0], simplex[2]);
        let f_spread = (worst.1 - best.1).abs();
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|(p, _)| [(p[0] - best.0[0]).abs(), (p[1] - best.0[1]).abs()])
            .fold(0.0_f64, f64::max);
        if f_spread <= FATOL * (1.0 + best.1.abs()) && x_spread <= XATOL {
            return Ok((best.0, best.1, iteration));
        }

        let centroid = [
            (simplex[0].0[0] + simplex[1].0[0]) / 2.0,
            (simplex[0].0[1] + simplex[1].0[1]) / 2.0,
        ];
        let towards = |coef: f64| -> [f64; 2] {
            [
                centroid[0] + coef * (worst.0[0] - centroid[0]),
                centroid[1] + coef * (worst.0[1] - centroid[1]),
            ]
        };

        let reflected = towards(-ALPHA);
        let f_reflected = f(&reflected);
        if f_reflected < best.1 {
            let expanded = towards(-ALPHA * GAMMA);
            let f_expanded = f(&expanded);
            simplex[2] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }
        if f_reflected < simplex[1].1 {
            simplex[2] = (reflected, f_reflected);
            continue;
        }

        let (contracted, limit) = if f_reflected < worst.1 {
            (towards(-ALPHA * RHO), f_reflected)
        } else {
            (towards(RHO), worst.1)
        };
        let f_contracted = f(&contracted);
        if f_contracted < limit {
            simplex[2] = (contracted, f_contracted);
            continue;
        }

        let anchor = best.0;
        for vertex in simplex.iter_mut().skip(1) {
            let p = [
                anchor[0] + SIGMA * (vertex.0[0] - anchor[0]),
                anchor[1] + SIGMA * (vertex.0[1] - anchor[1]),
            ];
            *vertex = (p, f(&p));
        }
    }

    Err(ForecastError::NonConvergence {
        iterations: MAX_ITERATIONS,
    })
}

fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    sum / actual.len() as f64
}

fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    (sum / actual.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yearly(values: &[u64], first_year: i32) -> Vec<YearTotal> {
        values
            .iter()
            .zip(first_year..)
            .map(|(v, year)| YearTotal { year, total: *v })
            .collect()
    }

    fn annual_births() -> Vec<YearTotal> {
        yearly(
            &[
                905_000, 918_000, 871_000, 842_000, 889_000, 931_000, 902_000, 884_000, 821_000,
                902_000, 845_000, 860_000,
            ],
            2012,
        )
    }

    #[test]
    fn totals_beyond_f64_precision_read_as_constant() {
        let base = 1u64 << 62;
        let series = yearly(&[base, base + 1, base + 3], 2021);
        assert_eq!(forecast(&series, 1), Err(ForecastError::ConstantSeries));
    }

    #[test]
    fn three_point_series_forecasts_two_years() {
        let series = yearly(&[902_000, 845_000, 860_000], 2021);
        let points = forecast(&series, 2).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].year, 2024);
        assert_eq!(points[1].year, 2025);
        for p in &points {
            assert!(p.predicted.is_finite());
            assert!(p.predicted >= 0.0);
            assert!(p.predicted > 700_000.0 && p.predicted < 1_000_000.0);
        }
    }

    #[test]
    fn forecast_is_deterministic() {
        let series = annual_births();
        let first = forecast(&series, 2).unwrap();
        let second = forecast(&series, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn twelve_year_series_stays_in_band() {
        let (model, points) = forecast_with_model(&annual_births(), 2).unwrap();
        assert!(model.phi().abs() < 1.0);
        assert!(model.theta().abs() < 1.0);
        for p in &points {
            assert!(p.predicted > 700_000.0 && p.predicted < 1_050_000.0);
            assert!(p.lower <= p.predicted && p.predicted <= p.upper);
        }
        // Interval widens with the horizon.
        assert!(points[1].upper - points[1].lower >= points[0].upper - points[0].lower);
    }

    #[test]
    fn linear_trend_is_extrapolated() {
        let series = yearly(&(0..12).map(|i| 1_000 + 10 * i).collect::<Vec<u64>>(), 2012);
        let points = forecast(&series, 1).unwrap();
        assert!((points[0].predicted - 1_120.0).abs() < 1.0, "got {}", points[0].predicted);
    }

    #[test]
    fn too_short_series_is_rejected() {
        for len in [0usize, 1, 2] {
            let series = yearly(&vec![900_000; len], 2012);
            let err = forecast(&series, 2).unwrap_err();
            assert_eq!(err, ForecastError::InsufficientData { required: 3, actual: len });
        }
    }

    #[test]
    fn constant_series_is_rejected() {
        let err = forecast(&yearly(&[850_000; 12], 2012), 2).unwrap_err();
        assert_eq!(err, ForecastError::ConstantSeries);
        let err = forecast(&yearly(&[0; 5], 2012), 2).unwrap_err();
        assert_eq!(err, ForecastError::ConstantSeries);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        assert_eq!(forecast(&annual_births(), 0).unwrap_err(), ForecastError::InvalidHorizon);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let err = Arima111::fit(&[1.0, f64::NAN, 3.0]).unwrap_err();
        assert!(matches!(err, ForecastError::NonFinite(_)));
    }

    #[test]
    fn accuracy_is_reported_in_sample() {
        let model = Arima111::fit(&annual_births().iter().map(|t| t.total as f64).collect::<Vec<_>>()).unwrap();
        assert_eq!(model.fitted_values().len(), 10);
        let acc = model.accuracy();
        assert!(acc.mae.is_finite() && acc.rmse >= acc.mae);
    }

    #[test]
    fn nelder_mead_finds_quadratic_minimum() {
        let (x, fx, _) = nelder_mead(|p| (p[0] - 1.0).powi(2) + (p[1] + 0.5).powi(2), [0.0, 0.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-4);
        assert!((x[1] + 0.5).abs() < 1e-4);
        assert!(fx < 1e-8);
    }
}
