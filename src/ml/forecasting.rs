use chrono::{Days, NaiveDate};

use super::regression::{fit_least_squares, r_squared, FeatureMatrix, ModelKind};
use super::series::NumericSeries;
use super::ForecastError;

/// Number of days projected past the last observation.
pub const FORECAST_HORIZON_DAYS: u64 = 90;

/// Two-sided 95% normal quantile used for the confidence band.
pub const CONFIDENCE_Z: f64 = 1.96;

/// Minimum number of observations needed to fit a trend.
pub const MIN_FORECAST_POINTS: usize = 2;

/// Confidence ceiling for a two-point fit, whose R² is trivially perfect.
pub const TWO_POINT_CONFIDENCE_CAP: f64 = 50.0;

/// Unrounded output of the trend forecaster.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendForecast {
    pub model: ModelKind,
    /// Calendar dates of the projection window, starting at the last observation.
    pub dates: Vec<NaiveDate>,
    /// Day offsets of `dates` relative to the first observation.
    pub offsets: Vec<i64>,
    pub values: Vec<f64>,
    pub band_half_width: f64,
    /// Goodness of fit as a percentage in `[0, 100]`.
    pub confidence_level: f64,
}

impl TrendForecast {
    pub fn lower_bound(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v - self.band_half_width)
            .collect()
    }

    pub fn upper_bound(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v + self.band_half_width)
            .collect()
    }
}

/// Fits a trend to `series` and projects it over the forecast horizon.
///
/// Two observations get a straight line; three or more get a quadratic. The
/// function is pure: the same series always yields the same forecast.
pub fn forecast_trend(series: &NumericSeries) -> Result<TrendForecast, ForecastError> {
    let n = series.len();
    if n < MIN_FORECAST_POINTS {
        return Err(ForecastError::InsufficientData {
            points: series.points(),
        });
    }

    let model = ModelKind::for_sample_count(n);
    let t = series.days_f64();
    let y = series.levels_f64();

    let design = FeatureMatrix::expand(model, &t);
    let fitted_model = fit_least_squares(&design, &y)?;
    let fitted = fitted_model.predict(&design)?;

    let (dates, offsets) = projection_window(series)?;
    let future: Vec<f64> = offsets.iter().map(|&d| d as f64).collect();
    let values = fitted_model.predict(&FeatureMatrix::expand(model, &future))?;

    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();
    let spread = match model {
        // a two-point OLS line passes through both points, so this is ~0
        ModelKind::Linear => residuals[0].abs(),
        ModelKind::Quadratic => population_std_dev(&residuals),
    };
    let band_half_width = CONFIDENCE_Z * spread;

    let mut confidence_level = (r_squared(&y, &fitted) * 100.0).clamp(0.0, 100.0);
    if model == ModelKind::Linear {
        confidence_level = confidence_level.min(TWO_POINT_CONFIDENCE_CAP);
    }

    if !band_half_width.is_finite() || !confidence_level.is_finite() {
        return Err(ForecastError::ModelFit(
            "residual statistics are not finite".to_string(),
        ));
    }

    Ok(TrendForecast {
        model,
        dates,
        offsets,
        values,
        band_half_width,
        confidence_level,
    })
}

/// The 91 calendar days from the last observation (inclusive) onwards, with
/// their offsets in the fitting feature space.
fn projection_window(series: &NumericSeries) -> Result<(Vec<NaiveDate>, Vec<i64>), ForecastError> {
    let (last_timestamp, last_day) = series
        .last_timestamp()
        .zip(series.last_day())
        .ok_or(ForecastError::EmptySeries)?;
    let last_date = last_timestamp.date();

    (0..=FORECAST_HORIZON_DAYS)
        .map(|step| {
            let date = last_date.checked_add_days(Days::new(step)).ok_or_else(|| {
                ForecastError::ModelFit(format!("forecast date overflow after {last_date}"))
            })?;
            Ok((date, last_day + step as i64))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|pairs| pairs.into_iter().unzip())
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
