//! Weighted least-squares fit of `f(x) = exp(p0 + p1 * x)`.
//!
//! The fit is a Levenberg-Marquardt iteration started from a weighted straight-line fit
//! to `ln(y)`. Parameter errors come from the inverse of the curvature matrix at the
//! minimum. When no point carries an error the points are weighted equally and the
//! covariance is scaled by chi2/ndf, so a perfect fit reports (near) zero uncertainty.
use nalgebra::{Matrix2, Vector2};

use super::error::FitError;

/// Fewest points the fit accepts (two parameters plus one degree of freedom)
pub const MIN_FIT_POINTS: usize = 3;
pub const MAX_ITERATIONS: usize = 500;

const CHI2_TOLERANCE: f64 = 1.0e-12;
const START_LAMBDA: f64 = 1.0e-3;
const MIN_LAMBDA: f64 = 1.0e-12;
const MAX_LAMBDA: f64 = 1.0e16;
const SINGULAR_TOLERANCE: f64 = 1.0e-12;

/// A point to fit. A sigma of None (or zero) means the point has no error of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPoint {
    pub x: f64,
    pub y: f64,
    pub sigma: Option<f64>,
}

impl FitPoint {
    pub fn new(x: f64, y: f64, sigma: Option<f64>) -> Self {
        Self { x, y, sigma }
    }
}

/// Result of the exponential fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialFit {
    pub constant: f64,
    pub slope: f64,
    pub constant_error: f64,
    pub slope_error: f64,
    pub chi_square: f64,
    pub ndf: usize,
    pub iterations: usize,
}

impl ExponentialFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        (self.constant + self.slope * x).exp()
    }

    /// chi2/ndf, NaN when there are no degrees of freedom
    pub fn reduced_chi_square(&self) -> f64 {
        if self.ndf == 0 {
            f64::NAN
        } else {
            self.chi_square / self.ndf as f64
        }
    }
}

/// Fit `exp(p0 + p1 * x)` to the points
pub fn fit_exponential(points: &[FitPoint]) -> Result<ExponentialFit, FitError> {
    if points.len() < MIN_FIT_POINTS {
        return Err(FitError::TooFewPoints(points.len(), MIN_FIT_POINTS));
    }

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let (weights, scale_errors) = fit_weights(points);

    let mut params = initial_guess(&xs, &ys, &weights);
    let mut chi2 = chi_square(&params, &xs, &ys, &weights);
    let mut lambda = START_LAMBDA;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let (alpha, beta) = curvature(&params, &xs, &ys, &weights);
        let mut damped = alpha;
        damped[(0, 0)] *= 1.0 + lambda;
        damped[(1, 1)] *= 1.0 + lambda;
        let trial = damped.lu().solve(&beta).map(|step| params + step);
        let trial_chi2 = trial.map(|t| chi_square(&t, &xs, &ys, &weights));

        match (trial, trial_chi2) {
            (Some(t), Some(c)) if c.is_finite() && c <= chi2 => {
                let improvement = chi2 - c;
                params = t;
                chi2 = c;
                lambda = (lambda / 10.0).max(MIN_LAMBDA);
                if improvement <= CHI2_TOLERANCE * chi2 {
                    converged = true;
                    break;
                }
            }
            _ => {
                // No downhill step at any damping means we sit at the minimum to
                // machine precision
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    converged = true;
                    break;
                }
            }
        }
    }

    if !converged || !params.iter().all(|p| p.is_finite()) {
        return Err(FitError::NotConverged(iterations));
    }

    let (alpha, _) = curvature(&params, &xs, &ys, &weights);
    let covariance = covariance(&alpha).ok_or(FitError::Singular)?;
    let ndf = points.len() - 2;
    let scale = if scale_errors {
        chi2 / ndf as f64
    } else {
        1.0
    };

    Ok(ExponentialFit {
        constant: params[0],
        slope: params[1],
        constant_error: (covariance[(0, 0)] * scale).sqrt(),
        slope_error: (covariance[(1, 1)] * scale).sqrt(),
        chi_square: chi2,
        ndf,
        iterations,
    })
}

/// Inverse-variance weights. Points without an error get the mean error of the others;
/// if no point has one all weights are 1 and the returned flag asks for the
/// covariance to be scaled by the fit quality.
fn fit_weights(points: &[FitPoint]) -> (Vec<f64>, bool) {
    let valid = |s: &Option<f64>| s.filter(|s| s.is_finite() && *s > 0.0);
    let sigmas: Vec<f64> = points.iter().filter_map(|p| valid(&p.sigma)).collect();
    if sigmas.is_empty() {
        return (vec![1.0; points.len()], true);
    }
    let mean_sigma = sigmas.iter().sum::<f64>() / sigmas.len() as f64;
    let weights = points
        .iter()
        .map(|p| {
            let sigma = valid(&p.sigma).unwrap_or(mean_sigma);
            1.0 / (sigma * sigma)
        })
        .collect();
    (weights, false)
}

/// Straight-line fit to ln(y) over the positive points
fn initial_guess(xs: &[f64], ys: &[f64], weights: &[f64]) -> Vector2<f64> {
    let (mut s, mut sx, mut sxx, mut sz, mut sxz) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for ((&x, &y), &w) in xs.iter().zip(ys).zip(weights) {
        if y <= 0.0 || !y.is_finite() {
            continue;
        }
        // sigma(ln y) = sigma(y) / y
        let wz = w * y * y;
        let z = y.ln();
        s += wz;
        sx += wz * x;
        sxx += wz * x * x;
        sz += wz * z;
        sxz += wz * x * z;
    }
    let det = s * sxx - sx * sx;
    if s > 0.0 && det.is_finite() && det > SINGULAR_TOLERANCE * s * sxx {
        let slope = (s * sxz - sx * sz) / det;
        let constant = (sz * sxx - sx * sxz) / det;
        return Vector2::new(constant, slope);
    }

    let mean_abs = ys.iter().map(|y| y.abs()).sum::<f64>() / ys.len() as f64;
    let constant = if mean_abs > 0.0 { mean_abs.ln() } else { 0.0 };
    Vector2::new(constant, 0.0)
}

fn chi_square(params: &Vector2<f64>, xs: &[f64], ys: &[f64], weights: &[f64]) -> f64 {
    xs.iter()
        .zip(ys)
        .zip(weights)
        .map(|((&x, &y), &w)| {
            let r = y - (params[0] + params[1] * x).exp();
            w * r * r
        })
        .sum()
}

/// Curvature matrix J^T W J and gradient J^T W r
fn curvature(
    params: &Vector2<f64>,
    xs: &[f64],
    ys: &[f64],
    weights: &[f64],
) -> (Matrix2<f64>, Vector2<f64>) {
    let mut alpha = Matrix2::zeros();
    let mut beta = Vector2::zeros();
    for ((&x, &y), &w) in xs.iter().zip(ys).zip(weights) {
        let f = (params[0] + params[1] * x).exp();
        let jac = Vector2::new(f, x * f);
        alpha += w * jac * jac.transpose();
        beta += w * (y - f) * jac;
    }
    (alpha, beta)
}

/// Parameter covariance, the inverse of the curvature matrix. None if the matrix is
/// singular to within the relative tolerance.
fn covariance(alpha: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let det = alpha.determinant();
    if !det.is_finite() || det <= SINGULAR_TOLERANCE * (alpha[(0, 0)] * alpha[(1, 1)]).abs() {
        return None;
    }
    alpha.try_inverse()
}
