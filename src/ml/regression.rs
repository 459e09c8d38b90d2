//! Ordinary least squares over a small polynomial feature space.
//!
//! The fit always includes an intercept. Features are mean-centred and the
//! resulting normal matrix (at most 2x2) is inverted through its eigen
//! decomposition, so a rank-deficient design (several observations on the same
//! day) yields the minimum-norm least-squares solution rather than a failure.

use serde::{Deserialize, Serialize};

use super::ForecastError;

/// Relative eigenvalue cut-off below which a direction of the normal matrix is
/// treated as null.
const RANK_TOLERANCE: f64 = 1e-12;

/// Trend model family, chosen from the number of available observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `y = a*t + b`
    Linear,
    /// `y = a + b*t + c*t^2`
    Quadratic,
}

impl ModelKind {
    /// Smallest sample count that supports the quadratic model.
    pub const QUADRATIC_MIN_POINTS: usize = 3;

    pub fn for_sample_count(n: usize) -> Self {
        if n >= Self::QUADRATIC_MIN_POINTS {
            ModelKind::Quadratic
        } else {
            ModelKind::Linear
        }
    }

    pub fn degree(self) -> usize {
        match self {
            ModelKind::Linear => 1,
            ModelKind::Quadratic => 2,
        }
    }

    /// Expands a day offset into the model's non-constant features.
    pub fn features(self, t: f64) -> Vec<f64> {
        match self {
            ModelKind::Linear => vec![t],
            ModelKind::Quadratic => vec![t, t * t],
        }
    }
}

/// Row-major design matrix without the intercept column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    kind: ModelKind,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn expand(kind: ModelKind, offsets: &[f64]) -> Self {
        Self {
            kind,
            rows: offsets.iter().map(|&t| kind.features(t)).collect(),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.kind.degree()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_means(&self) -> Vec<f64> {
        let n = self.rows.len() as f64;
        (0..self.width())
            .map(|j| self.rows.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect()
    }
}

/// A fitted linear model over a [`FeatureMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl FittedModel {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ForecastError> {
        if features.kind() != self.kind {
            return Err(ForecastError::ModelFit(format!(
                "feature expansion {:?} does not match fitted model {:?}",
                features.kind(),
                self.kind
            )));
        }

        let predictions: Vec<f64> = features
            .rows()
            .iter()
            .map(|row| self.predict_row(row))
            .collect();

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(ForecastError::ModelFit(
                "prediction produced a non-finite value".to_string(),
            ));
        }
        Ok(predictions)
    }
}

/// Fits `y ~ intercept + X * coefficients` by ordinary least squares.
pub fn fit_least_squares(x: &FeatureMatrix, y: &[f64]) -> Result<FittedModel, ForecastError> {
    if x.is_empty() {
        return Err(ForecastError::ModelFit(
            "cannot fit a model without observations".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(ForecastError::ModelFit(format!(
            "feature rows ({}) and targets ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    if y.iter().any(|v| !v.is_finite()) || x.rows().iter().flatten().any(|v| !v.is_finite()) {
        return Err(ForecastError::ModelFit(
            "input contains non-finite values".to_string(),
        ));
    }

    let k = x.width();
    let x_means = x.column_means();
    let y_mean = y.iter().sum::<f64>() / y.len() as f64;

    let mut gram = vec![vec![0.0; k]; k];
    let mut rhs = vec![0.0; k];
    for (row, &target) in x.rows().iter().zip(y) {
        let centred: Vec<f64> = row.iter().zip(&x_means).map(|(v, m)| v - m).collect();
        let dy = target - y_mean;
        for i in 0..k {
            rhs[i] += centred[i] * dy;
            for j in 0..k {
                gram[i][j] += centred[i] * centred[j];
            }
        }
    }

    let coefficients = solve_symmetric(&gram, &rhs)?;
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&x_means)
            .map(|(c, m)| c * m)
            .sum::<f64>();

    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ForecastError::ModelFit(
            "least squares solution is not finite".to_string(),
        ));
    }

    Ok(FittedModel {
        kind: x.kind(),
        intercept,
        coefficients,
    })
}

/// Coefficient of determination of `fitted` against `actual`.
///
/// A constant target scores 1.0 when reproduced exactly and 0.0 otherwise.
pub fn r_squared(actual: &[f64], fitted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(fitted)
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Solves `gram * c = rhs` with the Moore-Penrose pseudo-inverse of a symmetric
/// positive semi-definite matrix of order 1 or 2.
fn solve_symmetric(gram: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>, ForecastError> {
    match gram.len() {
        1 => {
            let g = gram[0][0];
            if g > 0.0 {
                Ok(vec![rhs[0] / g])
            } else {
                Ok(vec![0.0])
            }
        }
        2 => {
            let (a, b, d) = (gram[0][0], gram[0][1], gram[1][1]);
            let half_trace = (a + d) / 2.0;
            let radius = ((a - d) / 2.0).hypot(b);
            let lambda_max = half_trace + radius;
            if lambda_max <= 0.0 {
                return Ok(vec![0.0, 0.0]);
            }
            // det / lambda_max avoids the cancellation in half_trace - radius
            let lambda_min = ((a * d - b * b) / lambda_max).max(0.0);

            // eigenvector of lambda_max, picking the better conditioned form
            let (vx, vy) = if a >= d {
                (lambda_max - d, b)
            } else {
                (b, lambda_max - a)
            };
            let norm = vx.hypot(vy);
            let (ux, uy) = if norm > 0.0 {
                (vx / norm, vy / norm)
            } else {
                (1.0, 0.0)
            };
            let (wx, wy) = (-uy, ux);

            let mut solution = [0.0; 2];
            for (lambda, (ex, ey)) in [(lambda_max, (ux, uy)), (lambda_min, (wx, wy))] {
                if lambda > lambda_max * RANK_TOLERANCE {
                    let weight = (ex * rhs[0] + ey * rhs[1]) / lambda;
                    solution[0] += weight * ex;
                    solution[1] += weight * ey;
                }
            }
            Ok(solution.to_vec())
        }
        order => Err(ForecastError::ModelFit(format!(
            "unsupported feature count {order}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[rstest]
    #[case(0, ModelKind::Linear)]
    #[case(2, ModelKind::Linear)]
    #[case(3, ModelKind::Quadratic)]
    #[case(40, ModelKind::Quadratic)]
    fn model_kind_follows_sample_count(#[case] n: usize, #[case] expected: ModelKind) {
        assert_eq!(ModelKind::for_sample_count(n), expected);
    }

    #[test]
    fn two_point_line_is_exact() {
        let x = FeatureMatrix::expand(ModelKind::Linear, &[0.0, 10.0]);
        let model = fit_least_squares(&x, &[10.0, 30.0]).unwrap();
        assert!(close(model.coefficients[0], 2.0));
        assert!(close(model.intercept, 10.0));
        assert!(close(model.predict_row(&[20.0]), 50.0));
    }

    #[test]
    fn recovers_quadratic_coefficients() {
        let t = [0.0, 1.0, 2.0, 3.0, 5.0, 8.0];
        let y: Vec<f64> = t.iter().map(|t| 4.0 - 1.5 * t + 0.25 * t * t).collect();
        let model = fit_least_squares(&FeatureMatrix::expand(ModelKind::Quadratic, &t), &y).unwrap();

        assert!(close(model.intercept, 4.0));
        assert!(close(model.coefficients[0], -1.5));
        assert!(close(model.coefficients[1], 0.25));
    }

    #[test]
    fn least_squares_line_through_noisy_points() {
        // classic textbook set: slope 0.6, intercept 2.2
        let x = FeatureMatrix::expand(ModelKind::Linear, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let model = fit_least_squares(&x, &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!(close(model.coefficients[0], 0.6));
        assert!(close(model.intercept, 2.2));
    }

    #[test]
    fn identical_offsets_fall_back_to_the_mean() {
        let x = FeatureMatrix::expand(ModelKind::Quadratic, &[0.0, 0.0, 0.0]);
        let model = fit_least_squares(&x, &[3.0, 6.0, 9.0]).unwrap();
        assert_eq!(model.coefficients, vec![0.0, 0.0]);
        assert!(close(model.intercept, 6.0));
    }

    #[test]
    fn two_distinct_offsets_give_minimum_norm_fit() {
        // t and t^2 coincide on {0, 1}, so the weight is split evenly
        let x = FeatureMatrix::expand(ModelKind::Quadratic, &[0.0, 0.0, 1.0]);
        let model = fit_least_squares(&x, &[1.0, 3.0, 6.0]).unwrap();
        assert!(close(model.coefficients[0], model.coefficients[1]));
        let fitted = model.predict(&x).unwrap();
        assert!(close(fitted[0], 2.0));
        assert!(close(fitted[2], 6.0));
    }

    #[test]
    fn non_finite_targets_are_a_fit_error() {
        let x = FeatureMatrix::expand(ModelKind::Linear, &[0.0, 1.0]);
        assert_matches!(
            fit_least_squares(&x, &[1.0, f64::NAN]),
            Err(ForecastError::ModelFit(_))
        );
    }

    #[test]
    fn mismatched_lengths_are_a_fit_error() {
        let x = FeatureMatrix::expand(ModelKind::Linear, &[0.0, 1.0, 2.0]);
        assert_matches!(
            fit_least_squares(&x, &[1.0, 2.0]),
            Err(ForecastError::ModelFit(_))
        );
    }

    #[test]
    fn prediction_requires_matching_expansion() {
        let x = FeatureMatrix::expand(ModelKind::Linear, &[0.0, 1.0]);
        let model = fit_least_squares(&x, &[1.0, 2.0]).unwrap();
        let other = FeatureMatrix::expand(ModelKind::Quadratic, &[3.0]);
        assert_matches!(model.predict(&other), Err(ForecastError::ModelFit(_)));
    }

    #[test]
    fn r_squared_conventions() {
        assert_eq!(r_squared(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r_squared(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
        assert!(close(r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0));
        assert!(r_squared(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
    }
}
