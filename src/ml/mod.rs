/*!
 * # Forecasting Core
 *
 * Turns a time-ordered sequence of inventory movements into a cumulative stock
 * series, fits a trend model and projects it 90 days forward with a confidence
 * band.
 *
 * Everything in this module is synchronous and free of I/O; the HTTP and
 * database layers feed it plain movement records.
 */

pub mod forecasting;
pub mod regression;
pub mod result;
pub mod series;
pub mod stock_metrics;

pub use forecasting::{forecast_trend, TrendForecast, FORECAST_HORIZON_DAYS, MIN_FORECAST_POINTS};
pub use regression::ModelKind;
pub use result::{ForecastMetrics, ForecastResult, ForecastSeries, HistoricalSeries};
pub use series::{build_series, Movement, NumericSeries, SeriesPoint};

use thiserror::Error;

/// Failures of the forecasting pipeline. All of them are per-request and recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("No inventory movements found for the specified criteria")]
    EmptySeries,

    #[error(
        "Found only {} data point(s). Minimum {} required for trend analysis.",
        points.len(),
        MIN_FORECAST_POINTS
    )]
    InsufficientData { points: Vec<SeriesPoint> },

    #[error("{0}")]
    ModelFit(String),
}

/// Runs the full pipeline: series building, trend fitting and metric derivation.
pub fn forecast_inventory(movements: &[Movement]) -> Result<ForecastResult, ForecastError> {
    let series = build_series(movements)?;
    if series.len() < MIN_FORECAST_POINTS {
        return Err(ForecastError::InsufficientData {
            points: series.points(),
        });
    }

    let trend = forecast_trend(&series)?;
    tracing::debug!(
        model = ?trend.model,
        data_points = series.len(),
        band_half_width = trend.band_half_width,
        "Fitted inventory trend"
    );

    Ok(ForecastResult::assemble(&series, &trend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Days, NaiveDate, NaiveDateTime};

    fn at(offset: u64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.checked_add_days(Days::new(offset)))
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap()
    }

    fn movement(offset: u64, quantity: i64) -> Movement {
        Movement {
            timestamp: at(offset),
            quantity,
            shop_id: 3,
            product_id: 9,
        }
    }

    #[test]
    fn empty_input_reports_empty_series() {
        assert_matches!(forecast_inventory(&[]), Err(ForecastError::EmptySeries));
    }

    #[test]
    fn single_movement_echoes_the_available_point() {
        let err = forecast_inventory(&[movement(0, 12)]).unwrap_err();
        assert_matches!(&err, ForecastError::InsufficientData { points } => {
            assert_eq!(points.len(), 1);
            assert_eq!(points[0].date, at(0).date());
            assert_eq!(points[0].value, 12.0);
        });
        assert!(err.to_string().contains("Found only 1 data point"));
    }

    #[test]
    fn two_point_forecast_matches_the_line() {
        let result = forecast_inventory(&[movement(0, 10), movement(10, 20)]).unwrap();

        assert_eq!(result.historical.values, vec![10.0, 30.0]);
        assert_eq!(result.forecast.dates.len(), 91);
        assert_eq!(result.forecast.dates[0], at(10).date());
        assert_eq!(result.forecast.values[0], 30.0);
        assert_eq!(result.forecast.values[10], 50.0);
        assert_eq!(result.forecast.values[90], 210.0);
        assert_eq!(result.forecast.lower_bound, result.forecast.values);
        assert_eq!(result.forecast.upper_bound, result.forecast.values);

        // (210 - 30) / 30 * 100
        assert_eq!(result.metrics.growth_rate, 600.0);
        assert_eq!(result.metrics.confidence_level, 50.0);
        assert_eq!(result.metrics.data_points, 2);
        // 95th percentile of 30, 32, ..., 210 is 201
        assert_eq!(result.metrics.recommended_stock, 201);
    }

    #[test]
    fn zero_final_level_reports_zero_growth() {
        let result =
            forecast_inventory(&[movement(0, 5), movement(1, 3), movement(2, -8)]).unwrap();
        assert_eq!(result.historical.values.last(), Some(&0.0));
        assert_eq!(result.metrics.growth_rate, 0.0);
    }

    #[test]
    fn linear_history_is_projected_with_full_confidence() {
        let movements: Vec<Movement> = (0..6).map(|d| movement(d * 2, 4)).collect();
        let result = forecast_inventory(&movements).unwrap();

        assert_eq!(result.metrics.confidence_level, 100.0);
        assert_eq!(result.forecast.lower_bound, result.forecast.values);
        // levels 4..24 over days 0..10 -> slope 2 per day, day 100 -> 204
        assert_eq!(result.forecast.values[90], 204.0);
    }

    #[test]
    fn result_serializes_to_the_documented_shape() {
        let result = forecast_inventory(&[movement(0, 10), movement(10, 20)]).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["historical"]["dates"][0], "2024-05-01");
        assert!(json["forecast"]["lower_bound"].is_array());
        assert!(json["forecast"]["upper_bound"].is_array());
        assert_eq!(json["metrics"]["recommended_stock"], 201);
        assert_eq!(json["metrics"]["data_points"], 2);
    }
}
