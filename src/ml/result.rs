use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::forecasting::TrendForecast;
use super::series::NumericSeries;
use super::stock_metrics::{growth_rate, recommended_stock, round_all, round_decimal};

/// Observed cumulative stock levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoricalSeries {
    #[schema(value_type = Vec<String>, example = json!(["2024-01-01", "2024-01-11"]))]
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

/// Projected stock levels with a symmetric confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastSeries {
    #[schema(value_type = Vec<String>)]
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastMetrics {
    /// Percentage change between the last observation and the end of the horizon
    #[schema(example = 12.5)]
    pub growth_rate: f64,
    /// Goodness of fit (R² as a percentage)
    #[schema(example = 87.3)]
    pub confidence_level: f64,
    #[schema(example = 240)]
    pub recommended_stock: i64,
    #[schema(example = 42)]
    pub data_points: usize,
}

/// Forecast for one shop/product filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastResult {
    pub historical: HistoricalSeries,
    pub forecast: ForecastSeries,
    pub metrics: ForecastMetrics,
}

impl ForecastResult {
    /// Rounds the raw forecast for presentation and derives the summary metrics.
    pub fn assemble(series: &NumericSeries, trend: &TrendForecast) -> Self {
        let historical_values = round_all(&series.levels_f64(), 2);
        let values = round_all(&trend.values, 2);
        let lower_bound = round_all(&trend.lower_bound(), 2);
        let upper_bound = round_all(&trend.upper_bound(), 2);

        let last_historical = historical_values.last().copied().unwrap_or_default();
        let last_forecast = values.last().copied().unwrap_or_default();

        let metrics = ForecastMetrics {
            growth_rate: round_decimal(growth_rate(last_historical, last_forecast), 1),
            confidence_level: round_decimal(trend.confidence_level, 1),
            recommended_stock: recommended_stock(&upper_bound),
            data_points: series.len(),
        };

        Self {
            historical: HistoricalSeries {
                dates: series.dates(),
                values: historical_values,
            },
            forecast: ForecastSeries {
                dates: trend.dates.clone(),
                values,
                lower_bound,
                upper_bound,
            },
            metrics,
        }
    }
}
