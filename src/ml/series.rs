use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ForecastError;

/// One inventory transaction as read from the movement store.
///
/// `quantity` is already polarity-adjusted: inbound movements are positive,
/// outbound movements negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub timestamp: NaiveDateTime,
    pub quantity: i64,
    pub shop_id: i32,
    pub product_id: i32,
}

/// A single historical observation, used for diagnostics when a series is too
/// short to forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Cumulative stock levels paired with whole-day offsets from the first observation.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSeries {
    timestamps: Vec<NaiveDateTime>,
    days: Vec<i64>,
    levels: Vec<i64>,
}

// Never empty: `build_series` rejects an empty history.
#[allow(clippy::len_without_is_empty)]
impl NumericSeries {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Days since the first observation (`t`).
    pub fn days(&self) -> &[i64] {
        &self.days
    }

    /// Running stock level (`y`).
    pub fn levels(&self) -> &[i64] {
        &self.levels
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.timestamps.iter().map(NaiveDateTime::date).collect()
    }

    pub fn days_f64(&self) -> Vec<f64> {
        self.days.iter().map(|&d| d as f64).collect()
    }

    pub fn levels_f64(&self) -> Vec<f64> {
        self.levels.iter().map(|&v| v as f64).collect()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    pub fn last_day(&self) -> Option<i64> {
        self.days.last().copied()
    }

    /// The observations as calendar points, for diagnostic payloads.
    pub fn points(&self) -> Vec<SeriesPoint> {
        self.timestamps
            .iter()
            .zip(&self.levels)
            .map(|(ts, &level)| SeriesPoint {
                date: ts.date(),
                value: level as f64,
            })
            .collect()
    }
}

/// Turns an ordered set of movements into a cumulative numeric series.
///
/// Movements are expected in ascending timestamp order; an out-of-order input is
/// stably re-sorted so the running sum is always accumulated in time order.
pub fn build_series(movements: &[Movement]) -> Result<NumericSeries, ForecastError> {
    if movements.is_empty() {
        return Err(ForecastError::EmptySeries);
    }

    let ordered: Vec<&Movement> = if movements
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    {
        movements.iter().collect()
    } else {
        let mut sorted: Vec<&Movement> = movements.iter().collect();
        sorted.sort_by_key(|m| m.timestamp);
        sorted
    };
    let origin = ordered[0].timestamp;

    let mut timestamps = Vec::with_capacity(ordered.len());
    let mut days = Vec::with_capacity(ordered.len());
    let mut levels = Vec::with_capacity(ordered.len());
    let mut running = 0i64;

    for movement in ordered {
        running += movement.quantity;
        timestamps.push(movement.timestamp);
        // num_days truncates toward zero, which is floor for non-negative spans
        days.push((movement.timestamp - origin).num_days());
        levels.push(running);
    }

    Ok(NumericSeries {
        timestamps,
        days,
        levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn movement(ts: NaiveDateTime, quantity: i64) -> Movement {
        Movement {
            timestamp: ts,
            quantity,
            shop_id: 1,
            product_id: 1,
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_matches!(build_series(&[]), Err(ForecastError::EmptySeries));
    }

    #[test]
    fn accumulates_signed_quantities() {
        let series = build_series(&[
            movement(at(1, 9), 10),
            movement(at(1, 15), -3),
            movement(at(4, 8), 5),
        ])
        .unwrap();

        assert_eq!(series.levels(), &[10, 7, 12]);
        assert_eq!(series.days(), &[0, 0, 2]);
    }

    #[test]
    fn partial_days_are_floored() {
        // 23 hours after the first observation is still day 0
        let series = build_series(&[movement(at(1, 10), 1), movement(at(2, 9), 1)]).unwrap();
        assert_eq!(series.days(), &[0, 0]);
    }

    #[test]
    fn unordered_input_is_accumulated_in_time_order() {
        let series = build_series(&[movement(at(5, 0), -2), movement(at(1, 0), 4)]).unwrap();
        assert_eq!(series.levels(), &[4, 2]);
        assert_eq!(series.days(), &[0, 4]);
    }

    #[test]
    fn points_echo_dates_and_levels() {
        let series = build_series(&[movement(at(7, 12), 6)]).unwrap();
        assert_eq!(
            series.points(),
            vec![SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
                value: 6.0,
            }]
        );
    }
}
