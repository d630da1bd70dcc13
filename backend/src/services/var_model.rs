//! Vector autoregression estimation
//!
//! A VAR(p) model predicts each of K variables from the previous `p` values
//! of all K variables plus an intercept:
//!
//! ```text
//! y_t = c + A_1 y_{t-1} + ... + A_p y_{t-p} + u_t
//! ```
//!
//! [`OlsVarEstimator`] fits every equation by least squares over the shared
//! regressor matrix `Z`, whose rows are `[1, y_{t-1}, ..., y_{t-p}]`.

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pivots smaller than this fraction of the largest entry count as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VarError {
    #[error("lag order {order} needs at least {needed} observations, got {available}")]
    InsufficientObservations {
        order: usize,
        needed: usize,
        available: usize,
    },

    #[error("regressor matrix is singular")]
    SingularMatrix,

    #[error("lag order must be at least 1, got {0}")]
    InvalidOrder(usize),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Fitted VAR parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarCoefficients {
    /// Intercept per variable
    pub intercept: Vec<f64>,
    /// `lags[i][k][j]`: effect of variable `j` at lag `i + 1` on variable `k`
    pub lags: Vec<Vec<Vec<f64>>>,
}

impl VarCoefficients {
    pub fn order(&self) -> usize {
        self.lags.len()
    }

    pub fn dimension(&self) -> usize {
        self.intercept.len()
    }

    /// Checks that every lag matrix is K x K
    pub fn check_shape(&self) -> Result<(), VarError> {
        let k = self.dimension();
        for (i, lag) in self.lags.iter().enumerate() {
            if lag.len() != k || lag.iter().any(|row| row.len() != k) {
                return Err(VarError::DimensionMismatch(format!(
                    "lag {} coefficients are not {}x{}",
                    i + 1,
                    k,
                    k
                )));
            }
        }
        Ok(())
    }
}

/// Result of one fit
#[derive(Debug, Clone, PartialEq)]
pub struct VarFit {
    pub coefficients: VarCoefficients,
    /// Effective sample size, `T - p`
    pub observations: usize,
    /// `None` when the criterion is not finite, e.g. a perfect fit
    pub aic: Option<f64>,
}

/// AIC table produced by [`select_order`]
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSelection {
    /// One entry per evaluated order, `None` where it could not be fitted
    pub table: Vec<(usize, Option<f64>)>,
    pub selected: usize,
}

pub trait VarEstimator: Send + Sync {
    /// Fits a VAR of the given order to `data` (rows are time steps, oldest first)
    fn fit(&self, data: ArrayView2<'_, f64>, order: usize) -> Result<VarFit, VarError>;

    /// Forecasts `steps` rows forward from a seed window of exactly `p` rows
    fn forecast(
        &self,
        coefficients: &VarCoefficients,
        seed: ArrayView2<'_, f64>,
        steps: usize,
    ) -> Result<Array2<f64>, VarError>;
}

/// Equation-wise least squares with an intercept
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsVarEstimator;

impl VarEstimator for OlsVarEstimator {
    fn fit(&self, data: ArrayView2<'_, f64>, order: usize) -> Result<VarFit, VarError> {
        if order == 0 {
            return Err(VarError::InvalidOrder(order));
        }
        let (t, k) = data.dim();
        if k == 0 {
            return Err(VarError::DimensionMismatch("data has no variables".to_string()));
        }
        if t <= order {
            return Err(VarError::InsufficientObservations {
                order,
                needed: order + 1,
                available: t,
            });
        }

        let n = t - order;
        let m = 1 + k * order;

        let mut z = Array2::<f64>::zeros((n, m));
        for r in 0..n {
            z[[r, 0]] = 1.0;
            for lag in 1..=order {
                for j in 0..k {
                    z[[r, 1 + (lag - 1) * k + j]] = data[[order + r - lag, j]];
                }
            }
        }
        let y = data.slice(s![order.., ..]).to_owned();

        // Overdetermined: normal equations. Otherwise the minimum-norm solution.
        let b = if n >= m {
            solve(z.t().dot(&z), z.t().dot(&y))?
        } else {
            let g = solve(z.dot(&z.t()), y.clone())?;
            z.t().dot(&g)
        };

        if b.iter().any(|v| !v.is_finite()) {
            return Err(VarError::SingularMatrix);
        }

        let intercept = (0..k).map(|eq| b[[0, eq]]).collect();
        let lags = (1..=order)
            .map(|lag| {
                (0..k)
                    .map(|eq| (0..k).map(|j| b[[1 + (lag - 1) * k + j, eq]]).collect())
                    .collect()
            })
            .collect();

        let aic = if n > m {
            let residuals = &y - &z.dot(&b);
            let sigma = residuals.t().dot(&residuals) / n as f64;
            log_det(sigma)
                .map(|ld| ld + 2.0 * (k * m) as f64 / n as f64)
                .filter(|aic| aic.is_finite())
        } else {
            None
        };

        Ok(VarFit {
            coefficients: VarCoefficients { intercept, lags },
            observations: n,
            aic,
        })
    }

    fn forecast(
        &self,
        coefficients: &VarCoefficients,
        seed: ArrayView2<'_, f64>,
        steps: usize,
    ) -> Result<Array2<f64>, VarError> {
        coefficients.check_shape()?;
        let p = coefficients.order();
        let k = coefficients.dimension();
        if p == 0 {
            return Err(VarError::InvalidOrder(p));
        }
        if seed.dim() != (p, k) {
            return Err(VarError::DimensionMismatch(format!(
                "seed is {}x{}, model needs {}x{}",
                seed.nrows(),
                seed.ncols(),
                p,
                k
            )));
        }

        let mut history: Vec<Vec<f64>> = seed.rows().into_iter().map(|r| r.to_vec()).collect();
        let mut out = Array2::<f64>::zeros((steps, k));

        for step in 0..steps {
            let mut next = coefficients.intercept.clone();
            for (i, lag) in coefficients.lags.iter().enumerate() {
                let prev = &history[history.len() - 1 - i];
                for (eq, row) in lag.iter().enumerate() {
                    next[eq] += row.iter().zip(prev).map(|(a, y)| a * y).sum::<f64>();
                }
            }
            for (j, v) in next.iter().enumerate() {
                out[[step, j]] = *v;
            }
            history.push(next);
        }

        Ok(out)
    }
}

/// Highest order whose fit leaves residual degrees of freedom on a common sample
pub fn max_supported_order(rows: usize, variables: usize) -> usize {
    if rows < 2 {
        return 0;
    }
    // T - p > 1 + K * p
    (rows - 2) / (variables + 1)
}

/// Evaluates orders `1..=max_order` by AIC and picks the minimum.
///
/// Every order is fitted on the same trailing `T - max_order` rows so the
/// criteria are comparable. `max_order` is clamped to what the sample can
/// support. Orders whose fit fails or whose AIC is not finite are skipped.
pub fn select_order<E: VarEstimator + ?Sized>(
    estimator: &E,
    data: ArrayView2<'_, f64>,
    max_order: usize,
) -> Result<OrderSelection, VarError> {
    if max_order == 0 {
        return Err(VarError::InvalidOrder(max_order));
    }
    let (t, k) = data.dim();
    let max_p = max_order.min(max_supported_order(t, k));
    if max_p == 0 {
        return Err(VarError::InsufficientObservations {
            order: 1,
            needed: k + 3,
            available: t,
        });
    }

    let mut table = Vec::with_capacity(max_p);
    let mut best: Option<(usize, f64)> = None;
    let mut last_error = None;

    for p in 1..=max_p {
        let sample = data.slice(s![max_p - p.., ..]);
        match estimator.fit(sample, p) {
            Ok(fit) => {
                table.push((p, fit.aic));
                if let Some(aic) = fit.aic {
                    if best.map_or(true, |(_, b)| aic < b) {
                        best = Some((p, aic));
                    }
                }
            }
            Err(e) => {
                table.push((p, None));
                last_error = Some(e);
            }
        }
    }

    match best {
        Some((selected, _)) => Ok(OrderSelection { table, selected }),
        None => Err(last_error.unwrap_or(VarError::InsufficientObservations {
            order: max_p,
            needed: max_p * (k + 1) + 2,
            available: t,
        })),
    }
}

/// Solves `a x = b` for square `a` by Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array2<f64>) -> Result<Array2<f64>, VarError> {
    let n = a.nrows();
    if a.ncols() != n || b.nrows() != n {
        return Err(VarError::DimensionMismatch(format!(
            "cannot solve {}x{} system with {} right-hand rows",
            a.nrows(),
            a.ncols(),
            b.nrows()
        )));
    }

    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(VarError::SingularMatrix);
    }
    let tolerance = scale * PIVOT_TOLERANCE;
    let rhs = b.ncols();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() <= tolerance {
            return Err(VarError::SingularMatrix);
        }
        if pivot != col {
            for c in 0..n {
                a.swap([pivot, c], [col, c]);
            }
            for c in 0..rhs {
                b.swap([pivot, c], [col, c]);
            }
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[[row, c]] -= factor * a[[col, c]];
            }
            for c in 0..rhs {
                b[[row, c]] -= factor * b[[col, c]];
            }
        }
    }

    let mut x = Array2::<f64>::zeros((n, rhs));
    for row in (0..n).rev() {
        for c in 0..rhs {
            let mut sum = b[[row, c]];
            for j in row + 1..n {
                sum -= a[[row, j]] * x[[j, c]];
            }
            x[[row, c]] = sum / a[[row, row]];
        }
    }

    Ok(x)
}

/// Natural log of the determinant, `None` unless it is positive
fn log_det(mut a: Array2<f64>) -> Option<f64> {
    let n = a.nrows();
    let mut log_abs = 0.0;
    let mut negative = false;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]] == 0.0 {
            return None;
        }
        if pivot != col {
            for c in 0..n {
                a.swap([pivot, c], [col, c]);
            }
            negative = !negative;
        }
        let p = a[[col, col]];
        if p < 0.0 {
            negative = !negative;
        }
        log_abs += p.abs().ln();

        for row in col + 1..n {
            let factor = a[[row, col]] / p;
            for c in col..n {
                a[[row, c]] -= factor * a[[col, c]];
            }
        }
    }

    if negative {
        None
    } else {
        Some(log_abs)
    }
}
